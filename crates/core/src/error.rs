//! Broker error taxonomy.
//!
//! Every failure a `BrokerPort` reports is one of these variants; the retry
//! executor only looks at [`BrokerError::class`].

use thiserror::Error;

/// Errors that a broker collaborator can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds the broker asked us to wait.
        retry_after_secs: u64,
    },

    /// Broker rejected the order for a reason expected to clear up.
    #[error("transient rejection: {0}")]
    TransientRejection(String),

    /// Not enough buying power for the spread's margin requirement.
    #[error("insufficient buying power: {0}")]
    InsufficientBuyingPower(String),

    /// A leg references a strike the broker does not list.
    #[error("invalid strike: {0}")]
    InvalidStrike(String),

    /// Order fields were rejected as malformed.
    #[error("malformed order: {0}")]
    MalformedOrder(String),

    /// Credentials were rejected.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Order rejected outright.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// No usable quote for the underlying.
    #[error("price unavailable for {symbol}: {reason}")]
    PriceUnavailable { symbol: String, reason: String },

    /// Option chain or expirations could not be retrieved.
    #[error("option chain unavailable for {symbol}: {reason}")]
    ChainUnavailable { symbol: String, reason: String },
}

/// Retry classification of a broker error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Retryable,
    Terminal,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retryable => write!(f, "retryable"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Substrings that mark a free-text rejection as terminal.
const TERMINAL_KEYWORDS: &[(&str, fn(String) -> BrokerError)] = &[
    ("insufficient", BrokerError::InsufficientBuyingPower),
    ("buying power", BrokerError::InsufficientBuyingPower),
    ("invalid strike", BrokerError::InvalidStrike),
    ("invalid symbol", BrokerError::MalformedOrder),
    ("not found", BrokerError::MalformedOrder),
    ("malformed", BrokerError::MalformedOrder),
    ("unauthorized", BrokerError::Authentication),
    ("forbidden", BrokerError::Authentication),
    ("rejected", BrokerError::Rejected),
];

impl BrokerError {
    /// Creates a price-unavailable error.
    pub fn price_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PriceUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Creates a chain-unavailable error.
    pub fn chain_unavailable(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ChainUnavailable {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Maps a broker's free-text rejection message onto a variant.
    ///
    /// Messages without a terminal keyword are treated as transient.
    #[must_use]
    pub fn from_rejection_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        TERMINAL_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map_or_else(
                || Self::TransientRejection(message.to_string()),
                |(_, make)| make(message.to_string()),
            )
    }

    /// Retry classification.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Network(_)
            | Self::Timeout(_)
            | Self::RateLimited { .. }
            | Self::TransientRejection(_) => ErrorClass::Retryable,
            Self::InsufficientBuyingPower(_)
            | Self::InvalidStrike(_)
            | Self::MalformedOrder(_)
            | Self::Authentication(_)
            | Self::Rejected(_)
            | Self::PriceUnavailable { .. }
            | Self::ChainUnavailable { .. } => ErrorClass::Terminal,
        }
    }

    /// Returns true if the error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}
