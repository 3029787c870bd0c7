//! Exact numeric comparisons and JSON deep equality.
//!
//! Numbers are compared as decimals built from their shortest textual form,
//! so `0.1` is exactly one tenth and `multipleOf: 0.01` behaves as written.
//! Magnitudes outside `Decimal` range fall back to `f64`.

use rust_decimal::Decimal;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::str::FromStr;

pub(crate) fn to_decimal(number: &Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    let text = number.to_string();
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text).ok()
    } else {
        Decimal::from_str(&text).ok()
    }
}

pub(crate) fn compare(a: &Number, b: &Number) -> Option<Ordering> {
    match (to_decimal(a), to_decimal(b)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// A number with zero fractional part, whatever its literal looked like.
pub(crate) fn is_integer(number: &Number) -> bool {
    if number.is_i64() || number.is_u64() {
        return true;
    }
    match to_decimal(number) {
        Some(d) => d.fract().is_zero(),
        None => number.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
    }
}

pub(crate) fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (to_decimal(value), to_decimal(divisor)) {
        if d.is_zero() {
            return false;
        }
        if let Some(rem) = v.checked_rem(d) {
            return rem.is_zero();
        }
    }

    // Out of decimal range: tolerance scales with the quotient.
    let (Some(v), Some(d)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if d == 0.0 {
        return false;
    }
    let quotient = v / d;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= f64::EPSILON * quotient.abs().max(1.0)
}

/// Deep equality where numbers compare by mathematical value.
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, a)| b.get(key).is_some_and(|b| json_eq(a, b)))
        }
        _ => a == b,
    }
}
