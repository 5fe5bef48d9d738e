//! Guarded numeric helpers shared by every calculator
//!
//! Caller-supplied numbers may arrive as `f64` from the browser or as
//! `Decimal` from the database. These helpers turn NaN, infinities, zero
//! denominators and negative quantities into well-defined values instead of
//! panicking or propagating garbage.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Divide, returning `None` when the denominator is zero
pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Divide, returning `fallback` when the division is undefined
pub fn safe_divide_or(numerator: Decimal, denominator: Decimal, fallback: Decimal) -> Decimal {
    safe_divide(numerator, denominator).unwrap_or(fallback)
}

/// Square root; zero for zero or negative input
pub fn safe_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

/// Multiply, saturating at the `Decimal` bounds on overflow
pub fn saturating_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| decimal_bound(a.is_sign_negative() != b.is_sign_negative()))
}

/// Add, saturating at the `Decimal` bounds on overflow
pub fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b)
        .unwrap_or_else(|| decimal_bound(a.is_sign_negative()))
}

/// Subtract, saturating at the `Decimal` bounds on overflow
pub fn saturating_sub(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b)
        .unwrap_or_else(|| decimal_bound(a.is_sign_negative()))
}

fn decimal_bound(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// Convert an `f64` to `Decimal`, mapping NaN and infinities to zero
pub fn to_decimal(value: f64) -> Decimal {
    to_decimal_or(value, Decimal::ZERO)
}

/// Convert an `f64` to `Decimal`, mapping non-finite values to `fallback`
pub fn to_decimal_or(value: f64, fallback: Decimal) -> Decimal {
    if !value.is_finite() {
        return fallback;
    }
    Decimal::from_f64(value).unwrap_or(fallback)
}

/// Convert an `f64` to a whole quantity
///
/// Finite values are truncated toward zero; NaN, infinities and negatives
/// become 0.
pub fn to_quantity(value: f64) -> i64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.trunc() as i64
}

/// Clamp a quantity at zero
pub fn non_negative(value: i64) -> i64 {
    value.max(0)
}

/// Clamp a decimal at zero
pub fn non_negative_decimal(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Round half away from zero (business rounding, not banker's rounding)
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Ceiling as a whole quantity, saturating at the `i64` bounds
pub fn ceil_quantity(value: Decimal) -> i64 {
    saturating_i64(value.ceil())
}

/// Floor as a whole quantity, saturating at the `i64` bounds
pub fn floor_quantity(value: Decimal) -> i64 {
    saturating_i64(value.floor())
}

fn saturating_i64(value: Decimal) -> i64 {
    value.to_i64().unwrap_or(if value.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}
