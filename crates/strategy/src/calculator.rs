use chrono::NaiveDate;
use rust_decimal::Decimal;
use spread_bot_core::{OptionChainSnapshot, SpreadParameters, StrategyConfig};

use crate::error::Result;
use crate::expiration::{compute_expiration, resolve_listed_expiration};
use crate::strikes::{
    compute_long_strike, compute_short_strike, compute_short_strike_by_dollars, find_nearest_strike,
};
use crate::validation::{validate_spread, SpreadValidation, WidthBounds};

/// Unsnapped strikes derived from the underlying price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetStrikes {
    pub short: Decimal,
    pub long: Decimal,
}

/// Spread calculator bound to one strategy configuration.
///
/// Every method is pure; the orchestrator supplies prices, listed
/// expirations and chains fetched from the broker.
#[derive(Debug, Clone)]
pub struct SpreadCalculator {
    offset_percent: Decimal,
    offset_dollars: Option<Decimal>,
    spread_width: Decimal,
    bounds: WidthBounds,
    quantity: u32,
    expiration_offset_weeks: u32,
}

impl SpreadCalculator {
    #[must_use]
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            offset_percent: config.strike_offset_percent,
            offset_dollars: config.strike_offset_dollars,
            spread_width: config.spread_width,
            bounds: WidthBounds::new(config.min_spread_width, config.max_spread_width),
            quantity: config.contract_quantity,
            expiration_offset_weeks: config.expiration_offset_weeks,
        }
    }

    #[must_use]
    pub const fn bounds(&self) -> WidthBounds {
        self.bounds
    }

    /// Short and long strike targets for `current_price`.
    ///
    /// A positive dollar offset takes precedence over the percent offset.
    ///
    /// # Errors
    /// `InvalidInput` for a non-positive price or a long target `<= 0`.
    pub fn target_strikes(&self, current_price: Decimal) -> Result<TargetStrikes> {
        let short = match self.offset_dollars {
            Some(dollars) if dollars > Decimal::ZERO => {
                compute_short_strike_by_dollars(current_price, dollars)?
            }
            _ => compute_short_strike(current_price, self.offset_percent)?,
        };
        let long = compute_long_strike(short, self.spread_width)?;
        Ok(TargetStrikes { short, long })
    }

    /// Target Friday for a cycle executed on `execution_date`.
    #[must_use]
    pub fn target_expiration(&self, execution_date: NaiveDate) -> NaiveDate {
        compute_expiration(execution_date, self.expiration_offset_weeks)
    }

    /// Target Friday adjusted to what the broker actually lists.
    ///
    /// # Errors
    /// `NoValidExpiration` when the target week has no listed expiration on
    /// or after `execution_date`.
    pub fn resolve_expiration(&self, execution_date: NaiveDate, listed: &[NaiveDate]) -> Result<NaiveDate> {
        resolve_listed_expiration(self.target_expiration(execution_date), execution_date, listed)
    }

    /// Snaps both targets to the nearest listed strikes of `chain`.
    ///
    /// # Errors
    /// `EmptyChain` if the chain lists no strikes.
    pub fn snap_to_chain(&self, targets: TargetStrikes, chain: &OptionChainSnapshot) -> Result<SpreadParameters> {
        let strikes = chain.strikes();
        Ok(SpreadParameters {
            symbol: chain.symbol().to_string(),
            short_strike: find_nearest_strike(targets.short, strikes)?,
            long_strike: find_nearest_strike(targets.long, strikes)?,
            expiration: chain.expiration(),
            quantity: self.quantity,
        })
    }

    /// Validates `params` against `chain` and the configured width bounds.
    ///
    /// Snapping can shrink the spread; a width under half the configured
    /// `spread_width` is rejected.
    ///
    /// # Errors
    /// Same preconditions as [`validate_spread`].
    pub fn validate(&self, params: &SpreadParameters, chain: &OptionChainSnapshot) -> Result<SpreadValidation> {
        let verdict = validate_spread(params, chain.strikes(), self.bounds)?;
        if !verdict.is_valid() {
            return Ok(verdict);
        }
        if params.expiration != chain.expiration() {
            return Ok(SpreadValidation::Invalid(format!(
                "expiration {} not in chain for {}",
                params.expiration,
                chain.expiration()
            )));
        }
        if params.width() * Decimal::TWO < self.spread_width {
            return Ok(SpreadValidation::Invalid(format!(
                "width {} is under half the configured {}",
                params.width(),
                self.spread_width
            )));
        }
        Ok(verdict)
    }
}
