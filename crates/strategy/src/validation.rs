use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_bot_core::SpreadParameters;

use crate::error::{CalculatorError, Result};

/// Optional inclusive bounds on spread width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidthBounds {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl WidthBounds {
    #[must_use]
    pub const fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, width: Decimal) -> bool {
        self.min.map_or(true, |min| width >= min) && self.max.map_or(true, |max| width <= max)
    }
}

/// Domain verdict on a spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpreadValidation {
    Valid,
    Invalid(String),
}

impl SpreadValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Reason for an invalid verdict.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

/// Checks a spread against the listed strikes and width bounds.
///
/// Rules are applied in order and the first violation is reported:
/// positive quantity, short above long, width within `bounds`, both strikes
/// listed in `available`.
///
/// # Errors
/// `EmptyChain` if `available` is empty, `InvalidInput` if either strike is not
/// positive. Everything else is an [`SpreadValidation::Invalid`] verdict.
pub fn validate_spread(
    params: &SpreadParameters,
    available: &[Decimal],
    bounds: WidthBounds,
) -> Result<SpreadValidation> {
    if available.is_empty() {
        return Err(CalculatorError::EmptyChain);
    }
    if params.short_strike <= Decimal::ZERO || params.long_strike <= Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "strikes must be positive, got {}/{}",
            params.short_strike, params.long_strike
        )));
    }

    if params.quantity == 0 {
        return Ok(SpreadValidation::Invalid("quantity must be positive".to_string()));
    }
    if params.short_strike <= params.long_strike {
        return Ok(SpreadValidation::Invalid(format!(
            "short strike {} must be above long strike {}",
            params.short_strike, params.long_strike
        )));
    }

    let width = params.width();
    if !bounds.contains(width) {
        return Ok(SpreadValidation::Invalid(format!(
            "width {width} outside [{}, {}]",
            bounds.min.map_or_else(|| "-".to_string(), |v| v.to_string()),
            bounds.max.map_or_else(|| "-".to_string(), |v| v.to_string()),
        )));
    }

    for (leg, strike) in [("short", params.short_strike), ("long", params.long_strike)] {
        if !available.contains(&strike) {
            return Ok(SpreadValidation::Invalid(format!(
                "{leg} strike {strike} not listed for {} {}",
                params.symbol, params.expiration
            )));
        }
    }

    Ok(SpreadValidation::Valid)
}
