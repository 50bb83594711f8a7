//! Frequency reference data and recurrence kinds.
//!
//! # Responsibility
//! - Carry the immutable frequency record seeded by migrations.
//! - Resolve a frequency name into the closed set of recurrence kinds.
//!
//! # Invariants
//! - Name matching is case-insensitive and ignores surrounding whitespace.
//! - Names outside the known set never resolve to a kind.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Recurrence rule understood by the planning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyKind {
    OneTime,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FrequencyKind {
    /// All kinds in seed order.
    pub const ALL: [FrequencyKind; 5] = [
        FrequencyKind::OneTime,
        FrequencyKind::Daily,
        FrequencyKind::Weekly,
        FrequencyKind::Monthly,
        FrequencyKind::Yearly,
    ];

    /// Resolves a stored frequency name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "one-time" => Some(Self::OneTime),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    /// Canonical lowercase name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneTime => "one-time",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl Display for FrequencyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frequency reference record.
///
/// The engine only trusts `name`; `id` exists for storage references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub id: i64,
    pub name: String,
}

impl Frequency {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Builds a record for a known kind with its canonical name.
    pub fn of_kind(id: i64, kind: FrequencyKind) -> Self {
        Self::new(id, kind.as_str())
    }

    /// Resolves the recurrence kind, or `None` for unknown names.
    pub fn kind(&self) -> Option<FrequencyKind> {
        FrequencyKind::from_name(&self.name)
    }
}

/// Goal lifecycle status reference record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStatus {
    pub id: i64,
    pub name: String,
}

impl GoalStatus {
    pub const ACTIVE: &'static str = "active";
    pub const COMPLETED: &'static str = "completed";

    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case(Self::ACTIVE)
    }

    pub fn is_completed(&self) -> bool {
        self.name.trim().eq_ignore_ascii_case(Self::COMPLETED)
    }
}

/// Measurement unit reference record (e.g. `km`, `pages`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::{Frequency, FrequencyKind, GoalStatus};

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(FrequencyKind::from_name("Weekly"), Some(FrequencyKind::Weekly));
        assert_eq!(FrequencyKind::from_name(" ONE-TIME "), Some(FrequencyKind::OneTime));
        assert_eq!(FrequencyKind::from_name("fortnightly"), None);
    }

    #[test]
    fn canonical_names_round_trip() {
        for kind in FrequencyKind::ALL {
            assert_eq!(Frequency::of_kind(1, kind).kind(), Some(kind));
        }
    }

    #[test]
    fn status_checks_ignore_case() {
        assert!(GoalStatus::new(1, "Active").is_active());
        assert!(GoalStatus::new(2, "COMPLETED").is_completed());
        assert!(!GoalStatus::new(3, "paused").is_active());
    }
}
