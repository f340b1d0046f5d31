//! Numeric noise for measurement values
//!
//! A value is rounded to the nearest ten (ties to even) and then perturbed by
//! up to `±scale / 2` of the rounded value. Integers stay integers (truncated
//! toward zero), reals stay reals.

use rand::Rng;
use serde_json::{Number, Value};

/// A numeric measurement, tagged with its JSON kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementValue {
    Integer(i64),
    Real(f64),
}

impl MeasurementValue {
    /// Read a JSON number. Non-numbers yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let Value::Number(number) = value else {
            return None;
        };
        if let Some(i) = number.as_i64() {
            Some(Self::Integer(i))
        } else {
            number.as_f64().map(Self::Real)
        }
    }

    /// Back to JSON. Non-finite reals have no JSON form.
    pub fn to_json(self) -> Option<Value> {
        match self {
            Self::Integer(i) => Some(Value::from(i)),
            Self::Real(f) => Number::from_f64(f).map(Value::Number),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Real(f) => f,
        }
    }

    /// Nearest multiple of ten, same kind.
    pub fn round_to_tens(self) -> Self {
        match self {
            Self::Integer(i) => Self::Integer(round_i64_to_tens(i)),
            Self::Real(f) => Self::Real((f / 10.0).round_ties_even() * 10.0),
        }
    }
}

fn round_i64_to_tens(value: i64) -> i64 {
    let quotient = value.div_euclid(10);
    let remainder = value.rem_euclid(10);
    let rounded = if remainder > 5 || (remainder == 5 && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    };
    rounded.saturating_mul(10)
}

/// Perturb `value` with noise proportional to its rounded magnitude.
pub fn add_noise<R: Rng + ?Sized>(value: MeasurementValue, scale: f64, rng: &mut R) -> MeasurementValue {
    let rounded = value.round_to_tens().as_f64();
    let noise = rounded * (rng.gen::<f64>() - 0.5) * scale;
    let noisy = rounded + noise;
    match value {
        MeasurementValue::Integer(_) => MeasurementValue::Integer(noisy.trunc() as i64),
        MeasurementValue::Real(_) => MeasurementValue::Real(noisy),
    }
}
