use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_bot_core::{OrderRequest, OrderType, SpreadParameters, StrategyConfig, TimeInForce};
use thiserror::Error;

/// Spread parameters that cannot become an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderBuildError {
    #[error("symbol is empty")]
    EmptySymbol,

    #[error("short strike {short} must be above long strike {long}")]
    InvertedStrikes { short: Decimal, long: Decimal },

    #[error("strike {0} is not positive")]
    NonPositiveStrike(Decimal),

    #[error("quantity must be positive")]
    ZeroQuantity,

    #[error("limit credit {credit} must be positive and below width {width}")]
    InvalidCredit { credit: Decimal, width: Decimal },
}

/// Order type and time-in-force applied to every spread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Net credit for a limit order; market order when `None`.
    pub limit_credit: Option<Decimal>,
    pub time_in_force: TimeInForce,
}

impl OrderSettings {
    #[must_use]
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            limit_credit: config.limit_credit,
            time_in_force: config.time_in_force,
        }
    }
}

/// Builds the order for one spread.
///
/// Only re-checks the invariants a `SpreadParameters` value is supposed to
/// carry already; chain membership and width bounds are the calculator's job.
///
/// # Errors
/// Returns an [`OrderBuildError`] for the first broken invariant.
pub fn build_order(
    params: &SpreadParameters,
    dry_run: bool,
    settings: &OrderSettings,
) -> Result<OrderRequest, OrderBuildError> {
    if params.symbol.trim().is_empty() {
        return Err(OrderBuildError::EmptySymbol);
    }
    for strike in [params.short_strike, params.long_strike] {
        if strike <= Decimal::ZERO {
            return Err(OrderBuildError::NonPositiveStrike(strike));
        }
    }
    if params.short_strike <= params.long_strike {
        return Err(OrderBuildError::InvertedStrikes {
            short: params.short_strike,
            long: params.long_strike,
        });
    }
    if params.quantity == 0 {
        return Err(OrderBuildError::ZeroQuantity);
    }

    let order_type = match settings.limit_credit {
        None => OrderType::Market,
        Some(credit) if credit > Decimal::ZERO && credit < params.width() => OrderType::Limit { credit },
        Some(credit) => {
            return Err(OrderBuildError::InvalidCredit {
                credit,
                width: params.width(),
            })
        }
    };

    Ok(OrderRequest {
        symbol: params.symbol.clone(),
        short_strike: params.short_strike,
        long_strike: params.long_strike,
        expiration: params.expiration,
        quantity: params.quantity,
        order_type,
        time_in_force: settings.time_in_force,
        dry_run,
    })
}
