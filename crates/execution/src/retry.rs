use std::time::Duration;

use chrono::Utc;
use spread_bot_core::{BrokerPort, ErrorClass, ExecutionConfig, FailureClass, OrderOutcome, OrderRequest};
use tracing::{debug, error, info, warn};

/// Retry budget and backoff base for order submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// True once `attempt` (1-based) has used the whole budget.
    #[must_use]
    pub const fn is_exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts()
    }
}

/// Order id reported for a simulated submission.
#[must_use]
pub fn dry_run_order_id(symbol: &str, at: chrono::DateTime<Utc>) -> String {
    format!("DRY-RUN-{symbol}-{}", at.format("%Y%m%d%H%M%S"))
}

/// Submits `order`, retrying retryable broker errors with exponential backoff.
///
/// Terminal errors stop at once with `attempt_count` set to the attempt that
/// hit them. When every attempt fails retryably the outcome is
/// `RetriesExhausted` with `attempt_count = max_retries + 1`. Dry-run orders
/// never reach the broker.
pub async fn submit_with_retry(
    order: &OrderRequest,
    broker: &dyn BrokerPort,
    policy: &RetryPolicy,
) -> OrderOutcome {
    if order.dry_run {
        let now = Utc::now();
        let order_id = dry_run_order_id(&order.symbol, now);
        info!(
            symbol = %order.symbol,
            order_id = %order_id,
            short_strike = %order.short_strike,
            long_strike = %order.long_strike,
            expiration = %order.expiration,
            quantity = order.quantity,
            "Dry run: order not submitted"
        );
        return OrderOutcome::simulated(&order.symbol, order_id, now);
    }

    let mut attempt = 1;
    loop {
        debug!(
            symbol = %order.symbol,
            attempt,
            max_attempts = policy.max_attempts(),
            broker = broker.name(),
            "Submitting order"
        );

        let error = match broker.submit_order(order).await {
            Ok(ack) => {
                info!(
                    symbol = %order.symbol,
                    attempt,
                    order_id = %ack.order_id,
                    status = %ack.status,
                    fill_price = ?ack.fill_price,
                    "Order accepted"
                );
                return OrderOutcome::accepted(&order.symbol, ack, attempt, Utc::now());
            }
            Err(e) => e,
        };

        let class = error.class();
        if class == ErrorClass::Terminal {
            warn!(
                symbol = %order.symbol,
                attempt,
                error_class = %class,
                error = %error,
                "Order failed with terminal error"
            );
            return OrderOutcome::failed(
                &order.symbol,
                FailureClass::Terminal,
                error.to_string(),
                attempt,
                Utc::now(),
            );
        }

        if policy.is_exhausted(attempt) {
            error!(
                symbol = %order.symbol,
                attempt,
                error_class = %class,
                error = %error,
                "Order failed, retries exhausted"
            );
            return OrderOutcome::failed(
                &order.symbol,
                FailureClass::RetriesExhausted,
                error.to_string(),
                attempt,
                Utc::now(),
            );
        }

        let delay = policy.backoff_delay(attempt);
        warn!(
            symbol = %order.symbol,
            attempt,
            delay_secs = delay.as_secs_f64(),
            error_class = %class,
            error = %error,
            "Order submission failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}
