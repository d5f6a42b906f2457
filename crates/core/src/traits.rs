use crate::error::BrokerError;
use crate::types::{BrokerAck, CycleSummary, OptionChainSnapshot, OrderRequest};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Capabilities the spread engine needs from a brokerage.
///
/// Implementations are not assumed safe for concurrent use; the orchestrator
/// calls them one symbol at a time.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Whether the equity options market is open right now.
    async fn is_market_open(&self) -> Result<bool, BrokerError>;

    /// Latest trade (or mid) price of the underlying.
    async fn get_current_price(&self, symbol: &str) -> Result<Decimal, BrokerError>;

    /// Expirations the broker lists for the symbol.
    async fn list_expirations(&self, symbol: &str) -> Result<Vec<NaiveDate>, BrokerError>;

    /// Put strikes listed for one expiration.
    async fn get_option_chain(
        &self,
        symbol: &str,
        expiration: NaiveDate,
    ) -> Result<OptionChainSnapshot, BrokerError>;

    /// Transmits a spread order.
    async fn submit_order(&self, order: &OrderRequest) -> Result<BrokerAck, BrokerError>;

    /// Short broker name for logs.
    fn name(&self) -> &str;
}

/// One trading cycle, as seen by the scheduler.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    /// Runs a full cycle over the configured symbols.
    ///
    /// # Errors
    /// Only for failures outside per-symbol processing; symbol-level problems
    /// are reported inside the summary.
    async fn execute_cycle(&self) -> anyhow::Result<CycleSummary>;
}
