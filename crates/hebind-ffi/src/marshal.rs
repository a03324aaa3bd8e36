//! Numeric conversions at the foreign boundary
//!
//! Widening is lossless. Narrowing assumes the caller's values fit the
//! target width: anything wider keeps only its low bits (two's complement),
//! with no range check.

use crate::error::{BindError, BindResult};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::str::FromStr;

/// Caller integers to engine integers
pub fn widen_i32(values: &[i32]) -> Vec<i64> {
    values.iter().map(|v| i64::from(*v)).collect()
}

/// Engine integers to caller integers; out-of-range values wrap
pub fn narrow_i64(values: &[i64]) -> Vec<i32> {
    values.iter().map(|v| *v as i32).collect()
}

/// Engine sizes to caller sizes; out-of-range values wrap
pub fn narrow_u64(value: u64) -> u32 {
    value as u32
}

/// Arbitrary-precision unsigned integer crossing the boundary as a decimal string
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BigInteger(BigUint);

impl BigInteger {
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Integer quotient
    pub fn divided_by(&self, divisor: &BigInteger) -> BindResult<BigInteger> {
        if divisor.0.is_zero() {
            return Err(BindError::InvalidArgument("division by zero".into()));
        }
        Ok(BigInteger(&self.0 / &divisor.0))
    }

    /// Nearest double; infinity past `f64::MAX`
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::INFINITY)
    }
}

impl From<BigUint> for BigInteger {
    fn from(value: BigUint) -> Self {
        BigInteger(value)
    }
}

impl From<u64> for BigInteger {
    fn from(value: u64) -> Self {
        BigInteger(BigUint::from(value))
    }
}

impl FromStr for BigInteger {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BindError::InvalidArgument(format!("not a decimal integer: {s:?}")));
        }
        BigUint::from_str(digits)
            .map(BigInteger)
            .map_err(|e| BindError::InvalidArgument(e.to_string()))
    }
}

impl fmt::Display for BigInteger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
