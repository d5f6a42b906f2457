//! Weekly expiration selection.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::error::{CalculatorError, Result};

/// Friday `offset_weeks` weeks after the week containing `execution_date`.
///
/// Week 0 ends on the first Friday on or after `execution_date`; each offset
/// week adds seven days to it.
#[must_use]
pub fn compute_expiration(execution_date: NaiveDate, offset_weeks: u32) -> NaiveDate {
    let today = execution_date.weekday().num_days_from_monday();
    let friday = Weekday::Fri.num_days_from_monday();
    let days_to_friday = (friday + 7 - today) % 7;
    execution_date + Days::new(u64::from(days_to_friday) + 7 * u64::from(offset_weeks))
}

/// Picks the expiration to trade for a target Friday given the dates the
/// chain lists.
///
/// Uses `target` when listed. Otherwise falls back to the latest listed date
/// earlier in the same Monday-to-Friday week (e.g. Thursday before a Good
/// Friday), but never before `execution_date`. Never moves into a different
/// week.
///
/// # Errors
/// `NoValidExpiration` if nothing in the target's week on or after
/// `execution_date` is listed.
pub fn resolve_listed_expiration(
    target: NaiveDate,
    execution_date: NaiveDate,
    listed: &[NaiveDate],
) -> Result<NaiveDate> {
    if target >= execution_date && listed.contains(&target) {
        return Ok(target);
    }

    let week_start = target - Days::new(u64::from(target.weekday().num_days_from_monday()));
    let earliest = week_start.max(execution_date);
    listed
        .iter()
        .copied()
        .filter(|d| *d >= earliest && *d < target)
        .max()
        .ok_or(CalculatorError::NoValidExpiration { target })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monday_offset_one_is_following_weeks_friday() {
        // 2026-10-19 is a Monday
        assert_eq!(compute_expiration(date(2026, 10, 19), 1), date(2026, 10, 30));
    }

    #[test]
    fn offset_zero_is_this_weeks_friday() {
        assert_eq!(compute_expiration(date(2026, 10, 20), 0), date(2026, 10, 23));
    }

    #[test]
    fn friday_execution_counts_as_its_own_week() {
        assert_eq!(compute_expiration(date(2026, 10, 23), 0), date(2026, 10, 23));
        assert_eq!(compute_expiration(date(2026, 10, 23), 2), date(2026, 11, 6));
    }

    #[test]
    fn weekend_execution_rolls_to_next_friday() {
        // Saturday and Sunday advance to the coming Friday
        assert_eq!(compute_expiration(date(2026, 10, 24), 0), date(2026, 10, 30));
        assert_eq!(compute_expiration(date(2026, 10, 25), 1), date(2026, 11, 6));
    }

    #[test]
    fn result_is_always_a_friday() {
        let start = date(2026, 1, 1);
        for offset_days in 0..30u64 {
            for weeks in 0..4 {
                let expiration = compute_expiration(start + Days::new(offset_days), weeks);
                assert_eq!(expiration.weekday(), Weekday::Fri);
            }
        }
    }

    #[test]
    fn listed_friday_is_used_as_is() {
        let listed = [date(2026, 10, 23), date(2026, 10, 30)];
        assert_eq!(
            resolve_listed_expiration(date(2026, 10, 30), date(2026, 10, 20), &listed).unwrap(),
            date(2026, 10, 30)
        );
    }

    #[test]
    fn holiday_friday_falls_back_to_thursday() {
        // Good Friday 2026-04-03: the chain lists Thursday instead
        let listed = [date(2026, 3, 27), date(2026, 4, 2), date(2026, 4, 10)];
        assert_eq!(
            resolve_listed_expiration(date(2026, 4, 3), date(2026, 3, 24), &listed).unwrap(),
            date(2026, 4, 2)
        );
    }

    #[test]
    fn fallback_takes_latest_day_in_week() {
        let listed = [date(2026, 4, 1), date(2026, 3, 30), date(2026, 4, 2)];
        assert_eq!(
            resolve_listed_expiration(date(2026, 4, 3), date(2026, 3, 24), &listed).unwrap(),
            date(2026, 4, 2)
        );
    }

    #[test]
    fn fallback_never_leaves_the_week() {
        // Only the previous and next Fridays are listed
        let listed = [date(2026, 3, 27), date(2026, 4, 10)];
        assert_eq!(
            resolve_listed_expiration(date(2026, 4, 3), date(2026, 3, 24), &listed),
            Err(CalculatorError::NoValidExpiration {
                target: date(2026, 4, 3)
            })
        );
    }

    #[test]
    fn empty_listing_has_no_expiration() {
        assert!(resolve_listed_expiration(date(2026, 4, 3), date(2026, 3, 24), &[]).is_err());
    }

    #[test]
    fn fallback_never_lands_before_execution_date() {
        // Executed on Good Friday itself with no weekly offset
        let listed = [date(2026, 4, 2), date(2026, 4, 10)];
        assert_eq!(
            resolve_listed_expiration(date(2026, 4, 3), date(2026, 4, 3), &listed),
            Err(CalculatorError::NoValidExpiration {
                target: date(2026, 4, 3)
            })
        );

        // Executed on the Wednesday of a holiday week: Thursday is still ahead
        assert_eq!(
            resolve_listed_expiration(date(2026, 4, 3), date(2026, 4, 1), &listed).unwrap(),
            date(2026, 4, 2)
        );
        // Executed on Thursday: expiring the same day is allowed
        assert_eq!(
            resolve_listed_expiration(date(2026, 4, 3), date(2026, 4, 2), &listed).unwrap(),
            date(2026, 4, 2)
        );
    }
}
