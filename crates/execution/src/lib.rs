//! Order construction and retrying submission.
//!
//! [`build_order`] turns validated spread parameters into an
//! [`OrderRequest`](spread_bot_core::OrderRequest); [`submit_with_retry`]
//! drives it through a [`BrokerPort`](spread_bot_core::BrokerPort) and always
//! yields an [`OrderOutcome`](spread_bot_core::OrderOutcome).

pub mod order;
pub mod retry;

pub use order::{build_order, OrderBuildError, OrderSettings};
pub use retry::{dry_run_order_id, submit_with_retry, RetryPolicy};
