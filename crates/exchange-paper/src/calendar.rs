//! US equity options session calendar.

use chrono::{DateTime, Datelike, Days, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::US::Eastern;

/// Regular session open (hour, minute), Eastern time.
pub const SESSION_OPEN: (u32, u32) = (9, 30);

/// Regular session close (hour, minute), Eastern time.
pub const SESSION_CLOSE: (u32, u32) = (16, 0);

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether the regular session is open at `at`: weekdays 09:30 to 16:00
/// Eastern, excluding `holidays`.
#[must_use]
pub fn is_session_open(at: DateTime<Utc>, holidays: &[NaiveDate]) -> bool {
    let local = at.with_timezone(&Eastern);
    let date = local.date_naive();
    if is_weekend(date) || holidays.contains(&date) {
        return false;
    }
    let time = (local.hour(), local.minute());
    time >= SESSION_OPEN && time < SESSION_CLOSE
}

/// Weekly expirations for `weeks` weeks starting with the week of `from`.
///
/// Each week lists its Friday, or the Thursday before when that Friday is a
/// holiday. A week whose Thursday is a holiday as well lists nothing.
/// Expirations already in the past relative to `from` are omitted.
#[must_use]
pub fn weekly_expirations(from: NaiveDate, weeks: u32, holidays: &[NaiveDate]) -> Vec<NaiveDate> {
    let to_friday = (Weekday::Fri.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7;
    let first_friday = from + Days::new(u64::from(to_friday));

    (0..u64::from(weeks))
        .map(|w| first_friday + Days::new(7 * w))
        .filter_map(|friday| {
            if !holidays.contains(&friday) {
                return Some(friday);
            }
            let thursday = friday - Days::new(1);
            (!holidays.contains(&thursday) && thursday >= from).then_some(thursday)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn session_hours_in_eastern_time() {
        // 2026-10-20 is a Tuesday, EDT (UTC-4)
        assert!(!is_session_open(Utc.with_ymd_and_hms(2026, 10, 20, 13, 29, 0).unwrap(), &[]));
        assert!(is_session_open(Utc.with_ymd_and_hms(2026, 10, 20, 13, 30, 0).unwrap(), &[]));
        assert!(is_session_open(Utc.with_ymd_and_hms(2026, 10, 20, 19, 59, 0).unwrap(), &[]));
        assert!(!is_session_open(Utc.with_ymd_and_hms(2026, 10, 20, 20, 0, 0).unwrap(), &[]));
    }

    #[test]
    fn closed_on_weekends_and_holidays() {
        let saturday_noon = Utc.with_ymd_and_hms(2026, 10, 24, 16, 0, 0).unwrap();
        assert!(!is_session_open(saturday_noon, &[]));

        let thanksgiving_noon = Utc.with_ymd_and_hms(2026, 11, 26, 17, 0, 0).unwrap();
        assert!(is_session_open(thanksgiving_noon, &[]));
        assert!(!is_session_open(thanksgiving_noon, &[date(2026, 11, 26)]));
    }

    #[test]
    fn lists_fridays_from_current_week() {
        let listed = weekly_expirations(date(2026, 10, 19), 3, &[]);
        assert_eq!(listed, vec![date(2026, 10, 23), date(2026, 10, 30), date(2026, 11, 6)]);
    }

    #[test]
    fn holiday_friday_lists_thursday() {
        // Good Friday 2026-04-03
        let listed = weekly_expirations(date(2026, 3, 30), 2, &[date(2026, 4, 3)]);
        assert_eq!(listed, vec![date(2026, 4, 2), date(2026, 4, 10)]);
    }

    #[test]
    fn saturday_starts_with_next_friday() {
        let listed = weekly_expirations(date(2026, 10, 24), 1, &[]);
        assert_eq!(listed, vec![date(2026, 10, 30)]);
    }
}
