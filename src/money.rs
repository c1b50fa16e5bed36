//! Fixed-point money helpers.
//!
//! Domain values are `Decimal`; storage uses integer minor units (cents) and
//! basis points. Rounding to two decimals happens here, at the storage edge.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::error::{AppError, AppResult};

const BASIS_POINTS_SCALE: u32 = 4;

/// Rounds a monetary amount to two decimals, keeping the `0.00` scale.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded
}

pub fn to_cents(amount: Decimal) -> AppResult<i64> {
    let rounded = round_money(amount);
    rounded
        .mantissa()
        .to_i64()
        .ok_or_else(|| AppError::Validation(format!("amount {amount} is out of range")))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Rates are kept to four decimals (`0.2000` is 20%) and stored as basis points.
pub fn rate_to_bp(rate: Decimal) -> AppResult<i32> {
    let mut scaled = rate.round_dp(BASIS_POINTS_SCALE);
    scaled.rescale(BASIS_POINTS_SCALE);
    scaled
        .mantissa()
        .to_i32()
        .ok_or_else(|| AppError::Validation(format!("rate {rate} is out of range")))
}

pub fn bp_to_rate(bp: i32) -> Decimal {
    Decimal::new(i64::from(bp), BASIS_POINTS_SCALE)
}

pub fn decimal_from_f64(value: f64) -> AppResult<Decimal> {
    Decimal::from_f64(value)
        .ok_or_else(|| AppError::Validation(format!("value {value} is not a finite number")))
}
