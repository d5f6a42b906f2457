//! Calculator precondition failures.

use chrono::NaiveDate;
use thiserror::Error;

/// Precondition violations raised by the spread calculator.
///
/// Domain-validity problems with an otherwise well-formed spread are reported
/// as [`crate::SpreadValidation::Invalid`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("option chain has no strikes")]
    EmptyChain,

    /// Neither the target Friday nor an earlier day of its week is listed.
    #[error("no listed expiration in the week of {target}")]
    NoValidExpiration { target: NaiveDate },
}

impl CalculatorError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CalculatorError>;
