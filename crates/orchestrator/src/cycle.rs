//! One trading cycle: calculator then executor for every symbol.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use futures::FutureExt;
use thiserror::Error;
use tracing::{debug, info, warn};

use spread_bot_core::{
    is_valid_symbol, AppConfig, BrokerError, BrokerPort, CycleRunner, CycleSummary, FailureClass,
    OrderOutcome, SpreadParameters,
};
use spread_bot_execution::{build_order, submit_with_retry, OrderBuildError, OrderSettings, RetryPolicy};
use spread_bot_strategy::{CalculatorError, SpreadCalculator, SpreadValidation};

use crate::report;

/// Why a symbol was dropped before or during submission.
#[derive(Debug, Error)]
enum SymbolError {
    #[error("symbol '{0}' must be 1-5 uppercase letters")]
    InvalidSymbol(String),

    #[error("{0}")]
    Price(BrokerError),

    #[error("{0}")]
    Chain(BrokerError),

    #[error(transparent)]
    Calculator(#[from] CalculatorError),

    #[error("spread rejected: {0}")]
    Validation(String),

    #[error("order could not be built: {0}")]
    Build(#[from] OrderBuildError),
}

impl SymbolError {
    fn class(&self) -> FailureClass {
        match self {
            Self::InvalidSymbol(_) | Self::Build(_) => FailureClass::InvalidInput,
            Self::Price(_) => FailureClass::PriceUnavailable,
            Self::Chain(_) => FailureClass::ChainUnavailable,
            Self::Calculator(CalculatorError::InvalidInput(_)) => FailureClass::InvalidInput,
            Self::Calculator(CalculatorError::EmptyChain) => FailureClass::EmptyChain,
            Self::Calculator(CalculatorError::NoValidExpiration { .. }) => {
                FailureClass::NoValidExpiration
            }
            Self::Validation(_) => FailureClass::ValidationFailed,
        }
    }
}

/// Drives one cycle over a list of symbols.
///
/// Symbols run sequentially in the given order. Anything that goes wrong for
/// one symbol, panics included, becomes a failed [`OrderOutcome`] and the
/// cycle moves on to the next symbol.
pub struct CycleOrchestrator {
    broker: Arc<dyn BrokerPort>,
    calculator: SpreadCalculator,
    order_settings: OrderSettings,
    retry_policy: RetryPolicy,
    dry_run: bool,
    symbols: Vec<String>,
    timezone: Tz,
}

impl CycleOrchestrator {
    /// Builds an orchestrator from validated configuration.
    ///
    /// # Errors
    /// Returns an error if the schedule timezone does not parse.
    pub fn new(broker: Arc<dyn BrokerPort>, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            broker,
            calculator: SpreadCalculator::new(&config.strategy),
            order_settings: OrderSettings::from_config(&config.strategy),
            retry_policy: RetryPolicy::from_config(&config.execution),
            dry_run: config.execution.dry_run,
            symbols: config.strategy.symbols.clone(),
            timezone: config.schedule.tz()?,
        })
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Runs a cycle dated today in the schedule timezone.
    pub async fn run_cycle(&self, symbols: &[String]) -> CycleSummary {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        self.run_cycle_on(symbols, today).await
    }

    /// Runs a cycle as if executed on `execution_date`.
    ///
    /// Returns a `MarketClosed` summary without touching any symbol when the
    /// broker reports the market closed or cannot tell.
    pub async fn run_cycle_on(&self, symbols: &[String], execution_date: NaiveDate) -> CycleSummary {
        let executed_at = Utc::now();

        let open = match self.broker.is_market_open().await {
            Ok(open) => open,
            Err(e) => {
                warn!(broker = self.broker.name(), error = %e, "Market status check failed, treating market as closed");
                false
            }
        };
        if !open {
            info!(symbols = symbols.len(), "Market closed, skipping cycle");
            return CycleSummary::market_closed(executed_at, symbols.len());
        }

        info!(
            symbols = symbols.len(),
            %execution_date,
            dry_run = self.dry_run,
            broker = self.broker.name(),
            "Starting trading cycle"
        );

        let mut outcomes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let outcome = AssertUnwindSafe(self.process_symbol(symbol, execution_date))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    let message = panic_message(panic.as_ref());
                    warn!(symbol = %symbol, error = %message, "Symbol processing panicked");
                    OrderOutcome::failed(symbol, FailureClass::Unexpected, message, 0, Utc::now())
                });
            outcomes.push(outcome);
        }

        CycleSummary::completed(executed_at, symbols.len(), outcomes)
    }

    async fn process_symbol(&self, symbol: &str, execution_date: NaiveDate) -> OrderOutcome {
        let mut spread = None;
        match self.try_symbol(symbol, execution_date, &mut spread).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let class = e.class();
                warn!(symbol, error_class = %class, error = %e, "Skipping symbol");
                let outcome = OrderOutcome::failed(symbol, class, e.to_string(), 0, Utc::now());
                match spread {
                    Some(spread) => outcome.with_spread(spread),
                    None => outcome,
                }
            }
        }
    }

    async fn try_symbol(
        &self,
        symbol: &str,
        execution_date: NaiveDate,
        spread: &mut Option<SpreadParameters>,
    ) -> Result<OrderOutcome, SymbolError> {
        if !is_valid_symbol(symbol) {
            return Err(SymbolError::InvalidSymbol(symbol.to_string()));
        }

        let price = self
            .broker
            .get_current_price(symbol)
            .await
            .map_err(SymbolError::Price)?;
        let targets = self.calculator.target_strikes(price)?;
        debug!(symbol, %price, short_target = %targets.short, long_target = %targets.long, "Computed target strikes");

        let listed = self
            .broker
            .list_expirations(symbol)
            .await
            .map_err(SymbolError::Chain)?;
        let expiration = self.calculator.resolve_expiration(execution_date, &listed)?;

        let chain = self
            .broker
            .get_option_chain(symbol, expiration)
            .await
            .map_err(SymbolError::Chain)?;
        let params = self.calculator.snap_to_chain(targets, &chain)?;
        *spread = Some(params.clone());

        if params.short_strike != targets.short || params.long_strike != targets.long {
            debug!(
                symbol,
                target_short = %targets.short,
                short_strike = %params.short_strike,
                target_long = %targets.long,
                long_strike = %params.long_strike,
                "Snapped to listed strikes"
            );
        }

        if let SpreadValidation::Invalid(reason) = self.calculator.validate(&params, &chain)? {
            return Err(SymbolError::Validation(reason));
        }

        let order = build_order(&params, self.dry_run, &self.order_settings)?;
        info!(symbol, spread = %params.display_name(), order_type = ?order.order_type, "Submitting spread");

        let outcome = submit_with_retry(&order, self.broker.as_ref(), &self.retry_policy).await;
        Ok(outcome.with_spread(params))
    }
}

#[async_trait]
impl CycleRunner for CycleOrchestrator {
    async fn execute_cycle(&self) -> Result<CycleSummary> {
        let summary = self.run_cycle(&self.symbols).await;
        report::log_summary(&summary);
        Ok(summary)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}
