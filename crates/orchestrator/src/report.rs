//! Execution summary output.

use std::fmt::Write;

use spread_bot_core::{CycleStatus, CycleSummary, OrderOutcome};
use tracing::{info, warn};

/// Emits the cycle summary and one event per symbol.
pub fn log_summary(summary: &CycleSummary) {
    if summary.status == CycleStatus::MarketClosed {
        info!(
            executed_at = %summary.executed_at,
            total_symbols = summary.total_symbols,
            "Cycle skipped: market closed"
        );
        return;
    }

    for outcome in &summary.outcomes {
        if outcome.success {
            let spread = outcome.spread.as_ref().map(|s| s.display_name());
            info!(
                symbol = %outcome.symbol,
                order_id = outcome.order_id.as_deref().unwrap_or("-"),
                simulated = outcome.simulated,
                attempts = outcome.attempt_count,
                spread = spread.as_deref().unwrap_or("-"),
                "Symbol succeeded"
            );
        } else if let Some(error) = &outcome.error {
            warn!(
                symbol = %outcome.symbol,
                error_class = %error.class,
                error = %error.message,
                attempts = outcome.attempt_count,
                "Symbol failed"
            );
        }
    }

    let failed = summary.failed_symbols();
    info!(
        executed_at = %summary.executed_at,
        total_symbols = summary.total_symbols,
        success_count = summary.success_count,
        failure_count = summary.failure_count,
        success_rate_pct = %summary.success_rate_pct().round_dp(1),
        failed_symbols = ?failed,
        "Cycle complete"
    );
}

/// Plain-text summary for terminals.
#[must_use]
pub fn render_summary(summary: &CycleSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Execution summary {} ({})",
        summary.executed_at.format("%Y-%m-%d %H:%M:%S UTC"),
        summary.status
    );

    if summary.status == CycleStatus::MarketClosed {
        let _ = writeln!(out, "  market closed, {} symbols not processed", summary.total_symbols);
        return out;
    }

    let _ = writeln!(
        out,
        "  symbols: {}  succeeded: {}  failed: {}  success rate: {}%",
        summary.total_symbols,
        summary.success_count,
        summary.failure_count,
        summary.success_rate_pct().round_dp(1)
    );
    for outcome in &summary.outcomes {
        let _ = writeln!(out, "  {}", outcome_line(outcome));
    }

    let failed = summary.failed_symbols();
    if !failed.is_empty() {
        let _ = writeln!(out, "  failed symbols: {}", failed.join(", "));
    }
    out
}

fn outcome_line(outcome: &OrderOutcome) -> String {
    let spread = outcome
        .spread
        .as_ref()
        .map_or_else(String::new, |s| format!(" {}", s.display_name()));

    if outcome.success {
        let tag = if outcome.simulated { " (simulated)" } else { "" };
        format!(
            "{:<5} OK   {}{spread}{tag}",
            outcome.symbol,
            outcome.order_id.as_deref().unwrap_or("-")
        )
    } else {
        let (class, message) = outcome
            .error
            .as_ref()
            .map_or(("unknown".to_string(), ""), |e| (e.class.to_string(), e.message.as_str()));
        format!(
            "{:<5} FAIL {class}: {message}{spread} (attempts: {})",
            outcome.symbol, outcome.attempt_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use spread_bot_core::{FailureClass, SpreadParameters};

    fn summary() -> CycleSummary {
        let at = Utc.with_ymd_and_hms(2026, 10, 20, 14, 0, 0).unwrap();
        let spread = SpreadParameters {
            symbol: "SPY".to_string(),
            short_strike: dec!(440),
            long_strike: dec!(435),
            expiration: NaiveDate::from_ymd_opt(2026, 10, 30).unwrap(),
            quantity: 1,
        };
        CycleSummary::completed(
            at,
            3,
            vec![
                OrderOutcome::simulated("SPY", "DRY-RUN-SPY-20261020140000".to_string(), at).with_spread(spread),
                OrderOutcome::failed("QQQ", FailureClass::PriceUnavailable, "no quote", 0, at),
                OrderOutcome::failed("IWM", FailureClass::RetriesExhausted, "timeout", 4, at),
            ],
        )
    }

    #[test]
    fn render_lists_each_symbol_and_failures() {
        let text = render_summary(&summary());
        assert!(text.starts_with("Execution summary 2026-10-20 14:00:00 UTC (completed)"));
        assert!(text.contains("succeeded: 1  failed: 2  success rate: 33.3%"));
        assert!(text.contains("SPY   OK   DRY-RUN-SPY-20261020140000 SPY 440/435P 2026-10-30 x1 (simulated)"));
        assert!(text.contains("QQQ   FAIL price_unavailable: no quote (attempts: 0)"));
        assert!(text.contains("failed symbols: QQQ, IWM"));
    }

    #[test]
    fn render_market_closed() {
        let summary = CycleSummary::market_closed(Utc::now(), 2);
        let text = render_summary(&summary);
        assert!(text.contains("(market_closed)"));
        assert!(text.contains("2 symbols not processed"));
    }
}
