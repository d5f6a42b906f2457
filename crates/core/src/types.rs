//! Domain types shared by the calculator, executor, orchestrator and scheduler.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Strikes, expiration and size of one two-leg put credit spread.
///
/// The short leg is the higher strike; `short_strike > long_strike` holds for
/// every value that reaches the order builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadParameters {
    pub symbol: String,
    pub short_strike: Decimal,
    pub long_strike: Decimal,
    pub expiration: NaiveDate,
    pub quantity: u32,
}

impl SpreadParameters {
    /// Spread width (short minus long).
    #[must_use]
    pub fn width(&self) -> Decimal {
        self.short_strike - self.long_strike
    }

    /// Human-readable description (e.g., "SPY 440/435P 2026-10-23 x2").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {}/{}P {} x{}",
            self.symbol, self.short_strike, self.long_strike, self.expiration, self.quantity
        )
    }
}

/// Put strikes listed for one symbol/expiration pair.
///
/// Strikes are kept ascending and de-duplicated regardless of the order the
/// broker returned them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChainSnapshot {
    symbol: String,
    expiration: NaiveDate,
    strikes: Vec<Decimal>,
}

impl OptionChainSnapshot {
    pub fn new(
        symbol: impl Into<String>,
        expiration: NaiveDate,
        strikes: impl IntoIterator<Item = Decimal>,
    ) -> Self {
        let mut strikes: Vec<Decimal> = strikes.into_iter().collect();
        strikes.sort_unstable();
        strikes.dedup();
        Self {
            symbol: symbol.into(),
            expiration,
            strikes,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    /// Ascending strikes.
    #[must_use]
    pub fn strikes(&self) -> &[Decimal] {
        &self.strikes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    #[must_use]
    pub fn contains(&self, strike: Decimal) -> bool {
        self.strikes.binary_search(&strike).is_ok()
    }
}

/// Order type for the spread as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    /// Limit on the net credit received for the spread.
    Limit { credit: Decimal },
}

/// Time-in-force for the spread order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    /// Good-til-canceled: may be placed while the market is closed.
    #[default]
    Gtc,
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Gtc => write!(f, "gtc"),
        }
    }
}

/// A spread order ready to hand to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub short_strike: Decimal,
    pub long_strike: Decimal,
    pub expiration: NaiveDate,
    pub quantity: u32,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    /// Simulated orders never reach the broker.
    pub dry_run: bool,
}

/// Broker acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerAck {
    pub order_id: String,
    pub status: String,
    pub fill_price: Option<Decimal>,
}

/// Why a symbol failed within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    InvalidInput,
    PriceUnavailable,
    ChainUnavailable,
    EmptyChain,
    NoValidExpiration,
    ValidationFailed,
    RetriesExhausted,
    Terminal,
    Unexpected,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::PriceUnavailable => write!(f, "price_unavailable"),
            Self::ChainUnavailable => write!(f, "chain_unavailable"),
            Self::EmptyChain => write!(f, "empty_chain"),
            Self::NoValidExpiration => write!(f, "no_valid_expiration"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::RetriesExhausted => write!(f, "retries_exhausted"),
            Self::Terminal => write!(f, "terminal"),
            Self::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// Classified failure attached to a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub class: FailureClass,
    pub message: String,
}

/// Final result for one symbol in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub symbol: String,
    pub success: bool,
    /// True when the order was synthesized in dry-run mode.
    pub simulated: bool,
    pub order_id: Option<String>,
    pub fill_price: Option<Decimal>,
    pub error: Option<OutcomeError>,
    pub attempt_count: u32,
    /// Spread that was (or would have been) submitted, when one was computed.
    pub spread: Option<SpreadParameters>,
    pub timestamp: DateTime<Utc>,
}

impl OrderOutcome {
    /// Outcome for an order the broker accepted.
    #[must_use]
    pub fn accepted(
        symbol: impl Into<String>,
        ack: BrokerAck,
        attempt_count: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            success: true,
            simulated: false,
            order_id: Some(ack.order_id),
            fill_price: ack.fill_price,
            error: None,
            attempt_count,
            spread: None,
            timestamp,
        }
    }

    /// Outcome for a dry-run order.
    #[must_use]
    pub fn simulated(symbol: impl Into<String>, order_id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            success: true,
            simulated: true,
            order_id: Some(order_id),
            fill_price: None,
            error: None,
            attempt_count: 1,
            spread: None,
            timestamp,
        }
    }

    /// Failed outcome. `attempt_count` is zero when no submission was made.
    #[must_use]
    pub fn failed(
        symbol: impl Into<String>,
        class: FailureClass,
        message: impl Into<String>,
        attempt_count: u32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            success: false,
            simulated: false,
            order_id: None,
            fill_price: None,
            error: Some(OutcomeError {
                class,
                message: message.into(),
            }),
            attempt_count,
            spread: None,
            timestamp,
        }
    }

    /// Attaches the spread this outcome refers to.
    #[must_use]
    pub fn with_spread(mut self, spread: SpreadParameters) -> Self {
        self.spread = Some(spread);
        self
    }

    #[must_use]
    pub fn failure_class(&self) -> Option<FailureClass> {
        self.error.as_ref().map(|e| e.class)
    }
}

/// Whether a cycle processed its symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Completed,
    /// Market was not open; no symbol was processed.
    MarketClosed,
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::MarketClosed => write!(f, "market_closed"),
        }
    }
}

/// Aggregated result of one trading cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub executed_at: DateTime<Utc>,
    pub status: CycleStatus,
    pub total_symbols: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// One entry per processed symbol, in input order.
    pub outcomes: Vec<OrderOutcome>,
}

impl CycleSummary {
    #[must_use]
    pub fn completed(executed_at: DateTime<Utc>, total_symbols: usize, outcomes: Vec<OrderOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.success).count();
        let failure_count = outcomes.len() - success_count;
        Self {
            executed_at,
            status: CycleStatus::Completed,
            total_symbols,
            success_count,
            failure_count,
            outcomes,
        }
    }

    #[must_use]
    pub fn market_closed(executed_at: DateTime<Utc>, total_symbols: usize) -> Self {
        Self {
            executed_at,
            status: CycleStatus::MarketClosed,
            total_symbols,
            success_count: 0,
            failure_count: 0,
            outcomes: Vec::new(),
        }
    }

    /// Successful symbols as a percentage of all configured symbols.
    #[must_use]
    pub fn success_rate_pct(&self) -> Decimal {
        if self.total_symbols == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.success_count as u64) * Decimal::from(100)
            / Decimal::from(self.total_symbols as u64)
    }

    /// Symbols whose outcome failed, in input order.
    #[must_use]
    pub fn failed_symbols(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.symbol.as_str())
            .collect()
    }
}
