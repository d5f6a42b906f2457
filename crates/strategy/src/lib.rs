//! Strike and expiration calculation for weekly put credit spreads.
//!
//! Everything here is pure: no I/O, no clock. Callers pass in the current
//! price, the execution date and the broker's option chain.

pub mod calculator;
pub mod error;
pub mod expiration;
pub mod strikes;
pub mod validation;

pub use calculator::{SpreadCalculator, TargetStrikes};
pub use error::{CalculatorError, Result};
pub use expiration::{compute_expiration, resolve_listed_expiration};
pub use strikes::{
    compute_long_strike, compute_short_strike, compute_short_strike_by_dollars, find_nearest_strike,
};
pub use validation::{validate_spread, SpreadValidation, WidthBounds};
