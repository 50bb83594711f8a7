//! Goal decomposition into per-occurrence quotas.
//!
//! # Responsibility
//! - Split a goal's remaining target across the occurrences left before
//!   its deadline.
//! - Evaluate a proposed per-occurrence quantity: feasibility, shortfall
//!   and the deadline it would actually need.
//!
//! # Invariants
//! - Read-only: the goal snapshot is never mutated.
//! - Required quantity and needed occurrences round toward positive
//!   infinity so the plan is never under-ambitious.

use crate::engine::error::{PlanError, PlanResult};
use crate::engine::occurrence::{count_occurrences, date_of_nth_occurrence};
use crate::model::frequency::Frequency;
use crate::model::goal::Goal;
use chrono::NaiveDateTime;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of decomposing a goal under one frequency.
///
/// Only `required_quantity` is set when there is nothing left to plan or
/// no proposed quantity was evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decomposition {
    pub required_quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feasible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_deadline: Option<NaiveDateTime>,
    /// `remaining - proposed * occurrences`; negative values denote surplus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortfall: Option<Decimal>,
}

impl Decomposition {
    fn nothing_left() -> Self {
        Self::default()
    }
}

/// Decomposes `goal` into a per-occurrence quota for `frequency` as of `now`.
///
/// A `proposed_quantity` that is absent, zero or negative skips the
/// feasibility analysis.
///
/// # Errors
/// - `NoOccurrencesLeft` when the frequency yields no occurrence before the
///   deadline.
/// - `UnsupportedFrequency` when the frequency name is unknown.
/// - `DateOutOfRange` when the suggested deadline cannot be represented.
/// - `InvalidQuantity` when the arithmetic overflows the decimal range.
pub fn decompose(
    goal: &Goal,
    frequency: &Frequency,
    proposed_quantity: Option<Decimal>,
    now: NaiveDateTime,
) -> PlanResult<Decomposition> {
    if goal.is_target_reached() || !goal.status.is_active() {
        return Ok(Decomposition::nothing_left());
    }

    let remaining = goal.target_quantity - goal.current_progress;
    if now > goal.deadline {
        return Ok(Decomposition::nothing_left());
    }

    let occurrences = count_occurrences(frequency, now, goal.deadline)?;
    if occurrences <= 0 {
        return Err(PlanError::NoOccurrencesLeft {
            goal_id: goal.id,
            frequency: frequency.name.clone(),
        });
    }
    let occurrences = Decimal::from(occurrences);

    let mut result = Decomposition {
        required_quantity: ceil_div(remaining, occurrences).ok_or(PlanError::InvalidQuantity {
            field: "target_quantity",
            value: goal.target_quantity,
        })?,
        ..Decomposition::default()
    };

    if let Some(proposed) = proposed_quantity.filter(|value| *value > Decimal::ZERO) {
        let overflow = PlanError::InvalidQuantity {
            field: "quantity",
            value: proposed,
        };
        let total_contribution = proposed
            .checked_mul(occurrences)
            .ok_or_else(|| overflow.clone())?;
        result.feasible = Some(total_contribution >= remaining);

        let needed = ceil_div(remaining, proposed).ok_or_else(|| overflow.clone())?;
        let needed = needed.to_u64().ok_or(overflow)?;
        result.suggested_deadline = Some(date_of_nth_occurrence(frequency, now, needed)?);

        // Surplus plans are reported too, as a negative shortfall.
        if total_contribution.abs() != remaining {
            result.shortfall = Some(remaining - total_contribution);
        }
    }

    debug!(
        "event=goal_decompose module=engine status=ok goal_id={} frequency={} occurrences={} required={}",
        goal.id, frequency.name, occurrences, result.required_quantity
    );
    Ok(result)
}

/// Exact ceiling of `numerator / denominator` for positive operands.
///
/// Decimal division rounds at 28 significant digits, so the truncated
/// quotient is corrected against the exact products.
pub(crate) fn ceil_div(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    let mut quotient = numerator.checked_div(denominator)?.trunc();
    while quotient.checked_mul(denominator)? < numerator {
        quotient += Decimal::ONE;
    }
    while quotient > Decimal::ZERO && (quotient - Decimal::ONE).checked_mul(denominator)? >= numerator
    {
        quotient -= Decimal::ONE;
    }
    Some(quotient)
}
