//! Simulated brokerage for paper trading.
//!
//! [`PaperBroker`] implements [`BrokerPort`](spread_bot_core::BrokerPort)
//! from static configuration: prices per symbol, a strike grid around each
//! price, weekly expirations and the regular US session clock.

pub mod calendar;
pub mod paper;

pub use calendar::{is_session_open, weekly_expirations};
pub use paper::PaperBroker;
