//! Wall-clock trigger computation.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use spread_bot_core::{ExecutionDay, ScheduleConfig, MAX_OFFSET_MINUTES};

/// Longest DST gap searched when a local trigger time does not exist.
const MAX_GAP_MINUTES: i64 = 180;

/// When the cycle fires: `market_open + offset_minutes` on `day`, in `timezone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRule {
    pub day: ExecutionDay,
    pub market_open: NaiveTime,
    pub offset_minutes: i64,
    pub timezone: Tz,
}

impl TriggerRule {
    /// # Errors
    /// Returns an error if the market open time or timezone does not parse,
    /// or the offset is a day or more.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        check_offset(config.offset_minutes)?;
        Ok(Self {
            day: config.execution_day,
            market_open: config.market_open_time()?,
            offset_minutes: config.offset_minutes,
            timezone: config.tz()?,
        })
    }

    /// Next trigger at or after `now`.
    ///
    /// # Errors
    /// See [`compute_next_trigger`].
    pub fn next_after(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        compute_next_trigger(now, self.day, self.market_open, self.offset_minutes, self.timezone)
    }
}

/// Next occurrence of `execution_day` at `market_open_time + offset_minutes`
/// in `timezone`, at or after `now`.
///
/// A trigger exactly at `now` counts as upcoming. Each candidate is built from
/// the local calendar date, so the instant tracks DST changes. A local time
/// skipped by a spring-forward gap moves to the first valid minute after it;
/// an ambiguous fall-back time resolves to its earlier instant.
///
/// # Errors
/// Returns an error if `|offset_minutes|` is a day or more, or if no local
/// trigger time can be resolved.
pub fn compute_next_trigger(
    now: DateTime<Utc>,
    execution_day: ExecutionDay,
    market_open_time: NaiveTime,
    offset_minutes: i64,
    timezone: Tz,
) -> Result<DateTime<Utc>> {
    check_offset(offset_minutes)?;
    let offset = Duration::try_minutes(offset_minutes)
        .ok_or_else(|| anyhow!("offset_minutes {offset_minutes} out of range"))?;

    let today = now.with_timezone(&timezone).date_naive();
    // Start a day early: a positive offset can push yesterday's trigger past midnight.
    let start = today - Days::new(1);

    (0..16u64)
        .map(|n| start + Days::new(n))
        .filter(|date| matches_day(execution_day, *date))
        .filter_map(|date| localize(timezone, date.and_time(market_open_time) + offset))
        .find(|trigger| *trigger >= now)
        .ok_or_else(|| anyhow!("no {execution_day} trigger found within two weeks of {now}"))
}

fn check_offset(offset_minutes: i64) -> Result<()> {
    if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&offset_minutes) {
        bail!("offset_minutes {offset_minutes} must be within ±{MAX_OFFSET_MINUTES}");
    }
    Ok(())
}

fn matches_day(day: ExecutionDay, date: NaiveDate) -> bool {
    match day {
        ExecutionDay::Daily => true,
        ExecutionDay::Weekly(weekday) => date.weekday() == weekday,
    }
}

fn localize(timezone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    (0..=MAX_GAP_MINUTES)
        .find_map(|m| timezone.from_local_datetime(&(local + Duration::minutes(m))).earliest())
        .map(|t| t.with_timezone(&Utc))
}
