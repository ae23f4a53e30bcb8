//! Trade plan derivation
//!
//! Fixed-rule levels around the last price. The stop is the tighter of a
//! percentage stop and an absolute one; the target is a fixed percentage
//! above entry. Levels are rounded to cents with `rust_decimal`, half to
//! even on the exact binary value of the price.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::TradePlan;

/// Percentage stop distance (0.5%)
pub const STOP_PCT: f64 = 0.005;
/// Absolute stop distance, in currency units
pub const STOP_ABS: f64 = 0.50;
/// Percentage target distance (2%)
pub const TARGET_PCT: f64 = 0.02;

/// Round to `places` decimals, half to even on the exact binary value
pub fn round_half_even(value: f64, places: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| {
            let factor = 10f64.powi(places as i32);
            (value * factor).round() / factor
        })
}

/// Round a price to 2 decimal places
pub fn round_price(value: f64) -> f64 {
    round_half_even(value, 2)
}

/// Derive entry, stop and target from the last traded price.
///
/// `last_price` must be positive; callers only pass prices taken from a
/// cleaned series.
pub fn derive(last_price: f64) -> TradePlan {
    let pct_stop = last_price * (1.0 - STOP_PCT);
    let abs_stop = last_price - STOP_ABS;

    TradePlan {
        entry: last_price,
        stop: round_price(pct_stop.max(abs_stop)),
        target: round_price(last_price * (1.0 + TARGET_PCT)),
    }
}
