//! Linear-pacing projection of where a goal should be by now.

use crate::engine::error::{PlanError, PlanResult};
use crate::engine::occurrence::count_occurrences;
use crate::model::frequency::Frequency;
use crate::model::goal::Goal;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Decimal places kept for the per-occurrence ideal quantity.
const IDEAL_QUANTITY_SCALE: u32 = 4;

/// Returns the progress `goal` should have reached at `now` when paced
/// evenly across the occurrences of its tracking task.
///
/// `tracking_frequency` is the frequency of the goal's oldest linked task;
/// `None` projects zero. The per-occurrence quantity is rounded half up to
/// four places from the exact quotient. The result never exceeds the goal
/// target.
pub fn ideal_progress(
    goal: &Goal,
    tracking_frequency: Option<&Frequency>,
    now: NaiveDateTime,
) -> PlanResult<Decimal> {
    let Some(frequency) = tracking_frequency else {
        return Ok(Decimal::ZERO);
    };

    let occurrences = count_occurrences(frequency, goal.created_at, goal.deadline)?;
    if occurrences <= 0 {
        return Ok(Decimal::ZERO);
    }

    let reference = now.min(goal.deadline);
    let past_occurrences = count_occurrences(frequency, goal.created_at, reference)?.max(0);

    let ideal_quantity = div_round_half_up(goal.target_quantity, occurrences, IDEAL_QUANTITY_SCALE)
        .ok_or(PlanError::InvalidQuantity {
            field: "target_quantity",
            value: goal.target_quantity,
        })?;

    // An overflowing product is past any representable target.
    Ok(ideal_quantity
        .checked_mul(Decimal::from(past_occurrences))
        .map_or(goal.target_quantity, |ideal| ideal.min(goal.target_quantity)))
}

/// Rounds `numerator / denominator` half away from zero at `scale` places.
///
/// Works on the exact integer mantissa, so there is a single rounding step.
/// Values too wide for `scale` places fall back to the finest scale that
/// fits.
fn div_round_half_up(numerator: Decimal, denominator: i64, scale: u32) -> Option<Decimal> {
    if denominator <= 0 {
        return None;
    }

    let mantissa = numerator.mantissa();
    let source_scale = numerator.scale();
    (0..=scale).rev().find_map(|places| {
        let (dividend, divisor) = if places >= source_scale {
            let factor = 10_i128.checked_pow(places - source_scale)?;
            (mantissa.checked_mul(factor)?, i128::from(denominator))
        } else {
            let factor = 10_i128.checked_pow(source_scale - places)?;
            (mantissa, i128::from(denominator).checked_mul(factor)?)
        };

        let quotient = dividend / divisor;
        let remainder = dividend % divisor;
        let rounded = if remainder.abs().checked_mul(2)? >= divisor {
            quotient + dividend.signum()
        } else {
            quotient
        };
        Decimal::try_from_i128_with_scale(rounded, places).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::{div_round_half_up, ideal_progress};
    use crate::model::frequency::{Frequency, FrequencyKind, GoalStatus};
    use crate::model::goal::Goal;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, d)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn goal(target: Decimal) -> Goal {
        Goal::new("study", target, day(31), GoalStatus::new(1, "active"), day(1))
    }

    #[test]
    fn no_tracking_task_projects_zero() {
        assert_eq!(ideal_progress(&goal(dec!(90)), None, day(15)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn daily_pacing_is_linear() {
        let daily = Frequency::of_kind(2, FrequencyKind::Daily);
        // 30 occurrences, 3 per day, 10 days elapsed.
        assert_eq!(
            ideal_progress(&goal(dec!(90)), Some(&daily), day(11)).unwrap(),
            dec!(30)
        );
    }

    #[test]
    fn ideal_quantity_rounds_half_up_to_four_places() {
        let daily = Frequency::of_kind(2, FrequencyKind::Daily);
        // 100 / 30 = 3.33333.. -> 3.3333, times 3 elapsed days.
        assert_eq!(
            ideal_progress(&goal(dec!(100)), Some(&daily), day(4)).unwrap(),
            dec!(9.9999)
        );
    }

    #[test]
    fn projection_is_clamped_at_deadline_and_target() {
        let daily = Frequency::of_kind(2, FrequencyKind::Daily);
        let after_deadline = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        // 2 / 30 rounds to 0.0667; 30 occurrences overshoot 2 and clamp.
        assert_eq!(
            ideal_progress(&goal(dec!(2)), Some(&daily), after_deadline).unwrap(),
            dec!(2)
        );
    }

    #[test]
    fn no_occurrences_in_goal_window_projects_zero() {
        let monthly = Frequency::of_kind(4, FrequencyKind::Monthly);
        assert_eq!(
            ideal_progress(&goal(dec!(10)), Some(&monthly), day(20)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn projection_is_idempotent() {
        let weekly = Frequency::of_kind(3, FrequencyKind::Weekly);
        let target = goal(dec!(12));
        assert_eq!(
            ideal_progress(&target, Some(&weekly), day(20)).unwrap(),
            ideal_progress(&target, Some(&weekly), day(20)).unwrap()
        );
    }

    #[test]
    fn ideal_quantity_rounds_once_from_exact_quotient() {
        let target = Decimal::from_str("2.0000999999999999999999999999").unwrap();
        assert_eq!(div_round_half_up(target, 2, 4), Some(dec!(1.0000)));
        assert_eq!(div_round_half_up(dec!(2.0001), 2, 4), Some(dec!(1.0001)));
        assert_eq!(div_round_half_up(dec!(-2.0001), 2, 4), Some(dec!(-1.0001)));
        assert_eq!(div_round_half_up(dec!(1), 0, 4), None);
    }

    #[test]
    fn huge_target_is_clamped_instead_of_overflowing() {
        let daily = Frequency::of_kind(2, FrequencyKind::Daily);
        let huge = Goal::new("hoard", Decimal::MAX, day(3), GoalStatus::new(1, "active"), day(1));
        assert_eq!(
            ideal_progress(&huge, Some(&daily), day(3)).unwrap(),
            Decimal::MAX
        );
        assert_eq!(
            ideal_progress(&huge, Some(&daily), day(2)).unwrap(),
            div_round_half_up(Decimal::MAX, 2, 4).unwrap()
        );
    }
}
