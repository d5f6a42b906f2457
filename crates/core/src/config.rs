use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::TimeInForce;

/// Largest accepted `|offset_minutes|`; the trigger stays within a day of
/// market open.
pub const MAX_OFFSET_MINUTES: i64 = 24 * 60 - 1;

/// Largest accepted `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub strategy: StrategyConfig,
    pub schedule: ScheduleConfig,
    pub execution: ExecutionConfig,
    pub paper: PaperConfig,
    pub logging: LoggingConfig,
}

/// Spread construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub symbols: Vec<String>,
    /// Short strike distance below spot, in percent.
    pub strike_offset_percent: Decimal,
    /// Short strike distance below spot, in dollars. Overrides the percent
    /// offset when set and positive.
    pub strike_offset_dollars: Option<Decimal>,
    pub spread_width: Decimal,
    pub min_spread_width: Option<Decimal>,
    pub max_spread_width: Option<Decimal>,
    pub contract_quantity: u32,
    pub expiration_offset_weeks: u32,
    /// Net credit for a limit order; market order when unset.
    pub limit_credit: Option<Decimal>,
    pub time_in_force: TimeInForce,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            strike_offset_percent: Decimal::from(5),
            strike_offset_dollars: None,
            spread_width: Decimal::from(5),
            min_spread_width: None,
            max_spread_width: None,
            contract_quantity: 1,
            expiration_offset_weeks: 1,
            limit_credit: None,
            time_in_force: TimeInForce::Gtc,
        }
    }
}

/// Day(s) on which the cycle triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExecutionDay {
    Daily,
    Weekly(Weekday),
}

impl FromStr for ExecutionDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("daily") {
            return Ok(Self::Daily);
        }
        s.trim()
            .parse::<Weekday>()
            .map(Self::Weekly)
            .map_err(|_| anyhow!("invalid execution day: {s}"))
    }
}

impl TryFrom<String> for ExecutionDay {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ExecutionDay> for String {
    fn from(day: ExecutionDay) -> Self {
        day.to_string()
    }
}

impl std::fmt::Display for ExecutionDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Daily => "Daily",
            Self::Weekly(Weekday::Mon) => "Monday",
            Self::Weekly(Weekday::Tue) => "Tuesday",
            Self::Weekly(Weekday::Wed) => "Wednesday",
            Self::Weekly(Weekday::Thu) => "Thursday",
            Self::Weekly(Weekday::Fri) => "Friday",
            Self::Weekly(Weekday::Sat) => "Saturday",
            Self::Weekly(Weekday::Sun) => "Sunday",
        };
        write!(f, "{name}")
    }
}

/// When the cycle runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub execution_day: ExecutionDay,
    /// Market open as `HH:MM` in `timezone`.
    pub market_open: String,
    /// Minutes after market open (may be negative).
    pub offset_minutes: i64,
    /// IANA timezone name.
    pub timezone: String,
    pub poll_interval_secs: u64,
    /// Run one cycle immediately when the scheduler starts.
    pub run_on_start: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            execution_day: ExecutionDay::Weekly(Weekday::Tue),
            market_open: "09:30".to_string(),
            offset_minutes: 30,
            timezone: "America/New_York".to_string(),
            poll_interval_secs: 60,
            run_on_start: false,
        }
    }
}

impl ScheduleConfig {
    /// Parsed market open time.
    ///
    /// # Errors
    /// Returns an error if `market_open` is not `HH:MM`.
    pub fn market_open_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.market_open.trim(), "%H:%M")
            .map_err(|e| anyhow!("invalid market_open '{}': {e}", self.market_open))
    }

    /// Parsed reference timezone.
    ///
    /// # Errors
    /// Returns an error if `timezone` is not a known IANA name.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone '{}': {e}", self.timezone))
    }
}

/// Order submission behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// First backoff delay; doubles per retry.
    pub base_delay_ms: u64,
    pub dry_run: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            dry_run: false,
        }
    }
}

/// Simulated broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    /// Ignore the US equity session clock and report the market as open.
    pub always_open: bool,
    /// Underlying prices keyed by symbol.
    pub prices: BTreeMap<String, Decimal>,
    pub strike_increment: Decimal,
    /// Strikes listed on each side of spot.
    pub strikes_per_side: u32,
    /// Weekly expirations listed ahead.
    pub listed_weeks: u32,
    /// Exchange holidays; a Friday holiday lists the Thursday before instead.
    pub holidays: Vec<NaiveDate>,
    /// Net credit reported on simulated fills.
    pub fill_credit: Option<Decimal>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            always_open: false,
            prices: BTreeMap::new(),
            strike_increment: Decimal::ONE,
            strikes_per_side: 40,
            listed_weeks: 8,
            holidays: Vec::new(),
            fill_credit: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Append logs to this file instead of stderr.
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
        }
    }
}

/// Uppercase alphabetic, 1 to 5 characters.
#[must_use]
pub fn is_valid_symbol(symbol: &str) -> bool {
    (1..=5).contains(&symbol.len()) && symbol.chars().all(|c| c.is_ascii_uppercase())
}

impl AppConfig {
    /// Checks the ranges the engine relies on.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let s = &self.strategy;
        if s.symbols.is_empty() {
            bail!("at least one symbol is required");
        }
        if let Some(bad) = s.symbols.iter().find(|sym| !is_valid_symbol(sym)) {
            bail!("symbol '{bad}' must be 1-5 uppercase letters");
        }
        if s.strike_offset_percent < Decimal::ZERO || s.strike_offset_percent >= Decimal::from(100) {
            bail!("strike_offset_percent must be in [0, 100)");
        }
        if matches!(s.strike_offset_dollars, Some(d) if d < Decimal::ZERO) {
            bail!("strike_offset_dollars cannot be negative");
        }
        if s.spread_width <= Decimal::ZERO {
            bail!("spread_width must be positive");
        }
        for (name, bound) in [("min_spread_width", s.min_spread_width), ("max_spread_width", s.max_spread_width)] {
            if matches!(bound, Some(b) if b <= Decimal::ZERO) {
                bail!("{name} must be positive");
            }
        }
        if let (Some(min), Some(max)) = (s.min_spread_width, s.max_spread_width) {
            if min > max {
                bail!("min_spread_width ({min}) exceeds max_spread_width ({max})");
            }
        }
        if s.contract_quantity == 0 {
            bail!("contract_quantity must be positive");
        }
        if matches!(s.limit_credit, Some(c) if c <= Decimal::ZERO) {
            bail!("limit_credit must be positive");
        }

        self.schedule.market_open_time()?;
        self.schedule.tz()?;
        if self.schedule.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be positive");
        }
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.schedule.offset_minutes) {
            bail!("offset_minutes must be within ±{MAX_OFFSET_MINUTES}");
        }

        if self.execution.max_retries > MAX_RETRIES_LIMIT {
            bail!("max_retries cannot exceed {MAX_RETRIES_LIMIT}");
        }

        if self.paper.strike_increment <= Decimal::ZERO {
            bail!("paper.strike_increment must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.strategy.symbols = vec!["SPY".to_string(), "QQQ".to_string()];
        config
    }

    #[test]
    fn default_with_symbols_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn rejects_missing_or_malformed_symbols() {
        let mut config = valid();
        config.strategy.symbols.clear();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.strategy.symbols.push("spy".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spy"));

        let mut config = valid();
        config.strategy.symbols.push("TOOLONG".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_offset_and_width() {
        let mut config = valid();
        config.strategy.strike_offset_percent = dec!(100);
        assert!(config.validate().is_err());

        let mut config = valid();
        config.strategy.spread_width = dec!(0);
        assert!(config.validate().is_err());

        let mut config = valid();
        config.strategy.min_spread_width = Some(dec!(10));
        config.strategy.max_spread_width = Some(dec!(5));
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_schedule_fields() {
        let mut config = valid();
        config.schedule.market_open = "9h30".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.schedule.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.schedule.poll_interval_secs = 0;
        assert!(config.validate().is_err());

        for offset in [24 * 60, -24 * 60, i64::MAX, i64::MIN] {
            let mut config = valid();
            config.schedule.offset_minutes = offset;
            assert!(config.validate().is_err(), "{offset}");
        }
        let mut config = valid();
        config.schedule.offset_minutes = -MAX_OFFSET_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn caps_retry_budget() {
        let mut config = valid();
        config.execution.max_retries = MAX_RETRIES_LIMIT;
        assert!(config.validate().is_ok());

        config.execution.max_retries = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn execution_day_parses_names_and_daily() {
        assert_eq!("Tuesday".parse::<ExecutionDay>().unwrap(), ExecutionDay::Weekly(Weekday::Tue));
        assert_eq!("fri".parse::<ExecutionDay>().unwrap(), ExecutionDay::Weekly(Weekday::Fri));
        assert_eq!("Daily".parse::<ExecutionDay>().unwrap(), ExecutionDay::Daily);
        assert!("someday".parse::<ExecutionDay>().is_err());
        assert_eq!(ExecutionDay::Weekly(Weekday::Wed).to_string(), "Wednesday");
    }

    #[test]
    fn schedule_helpers_parse() {
        let schedule = ScheduleConfig::default();
        assert_eq!(
            schedule.market_open_time().unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(schedule.tz().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn symbol_format() {
        assert!(is_valid_symbol("SPY"));
        assert!(is_valid_symbol("A"));
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol("BRK.B"));
        assert!(!is_valid_symbol("ABCDEF"));
    }
}
