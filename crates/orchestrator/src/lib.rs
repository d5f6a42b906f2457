//! Trading cycle orchestration.
//!
//! Runs the spread calculator and the retrying executor for each configured
//! symbol, isolating per-symbol failures, and reports the aggregated
//! [`CycleSummary`](spread_bot_core::CycleSummary).

pub mod cycle;
pub mod report;

pub use cycle::CycleOrchestrator;
pub use report::{log_summary, render_summary};
