//! Strike arithmetic and snapping to listed strikes.

use rust_decimal::Decimal;

use crate::error::{CalculatorError, Result};

/// Short put strike `offset_percent` below spot: `price * (1 - offset/100)`.
///
/// # Errors
/// `InvalidInput` if `current_price <= 0` or `offset_percent` is outside `[0, 100)`.
pub fn compute_short_strike(current_price: Decimal, offset_percent: Decimal) -> Result<Decimal> {
    if current_price <= Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "current price must be positive, got {current_price}"
        )));
    }
    if offset_percent < Decimal::ZERO || offset_percent >= Decimal::ONE_HUNDRED {
        return Err(CalculatorError::invalid_input(format!(
            "offset percent must be in [0, 100), got {offset_percent}"
        )));
    }

    Ok(current_price * (Decimal::ONE - offset_percent / Decimal::ONE_HUNDRED))
}

/// Short put strike a fixed dollar amount below spot.
///
/// # Errors
/// `InvalidInput` if the price is not positive, the offset is negative, or the
/// resulting strike is not positive.
pub fn compute_short_strike_by_dollars(current_price: Decimal, offset_dollars: Decimal) -> Result<Decimal> {
    if current_price <= Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "current price must be positive, got {current_price}"
        )));
    }
    if offset_dollars < Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "offset dollars cannot be negative, got {offset_dollars}"
        )));
    }

    let strike = current_price - offset_dollars;
    if strike <= Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "offset ${offset_dollars} leaves no positive strike below {current_price}"
        )));
    }
    Ok(strike)
}

/// Long put strike `spread_width` below the short strike.
///
/// # Errors
/// `InvalidInput` if the width is not positive or the result is `<= 0`.
pub fn compute_long_strike(short_strike: Decimal, spread_width: Decimal) -> Result<Decimal> {
    if spread_width <= Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "spread width must be positive, got {spread_width}"
        )));
    }

    let long_strike = short_strike - spread_width;
    if long_strike <= Decimal::ZERO {
        return Err(CalculatorError::invalid_input(format!(
            "long strike {short_strike} - {spread_width} is not positive"
        )));
    }
    Ok(long_strike)
}

/// Listed strike closest to `target`. Exact ties resolve to the lower strike.
///
/// # Errors
/// `EmptyChain` if `available` is empty.
pub fn find_nearest_strike(target: Decimal, available: &[Decimal]) -> Result<Decimal> {
    available
        .iter()
        .copied()
        .min_by(|a, b| {
            (*a - target)
                .abs()
                .cmp(&(*b - target).abs())
                .then_with(|| a.cmp(b))
        })
        .ok_or(CalculatorError::EmptyChain)
}
