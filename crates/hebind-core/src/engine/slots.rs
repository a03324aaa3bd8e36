//! Slot-wise arithmetic for the mock engine: Z_t for BFV/BGV, f64 for CKKS.

use super::{EngineError, EngineResult};
use crate::objects::PlaintextValues;
use crate::params::{SchemeFamily, SchemeParams};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) enum Slots {
    Modular(Vec<u64>),
    Real(Vec<f64>),
}

impl Slots {
    pub(crate) fn len(&self) -> usize {
        match self {
            Slots::Modular(v) => v.len(),
            Slots::Real(v) => v.len(),
        }
    }

    /// Left rotation: `out[j] = in[(j + k) mod n]`
    pub(crate) fn rotate(&self, k: usize) -> Slots {
        fn rot<T: Copy>(v: &[T], k: usize) -> Vec<T> {
            let n = v.len();
            if n == 0 {
                return Vec::new();
            }
            (0..n).map(|j| v[(j + k) % n]).collect()
        }
        match self {
            Slots::Modular(v) => Slots::Modular(rot(v, k)),
            Slots::Real(v) => Slots::Real(rot(v, k)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Ring {
    Modular(u64),
    Real,
}

fn mismatch() -> EngineError {
    EngineError::Incompatible("slot vectors differ in ring or length".into())
}

impl Ring {
    pub(crate) fn for_params(params: &SchemeParams) -> Ring {
        match params.family {
            SchemeFamily::Ckks => Ring::Real,
            SchemeFamily::Bfv | SchemeFamily::Bgv => Ring::Modular(params.plaintext_modulus),
        }
    }

    pub(crate) fn zero(&self, n: usize) -> Slots {
        match self {
            Ring::Modular(_) => Slots::Modular(vec![0; n]),
            Ring::Real => Slots::Real(vec![0.0; n]),
        }
    }

    pub(crate) fn sample_uniform<R: Rng>(&self, n: usize, rng: &mut R) -> Slots {
        match self {
            Ring::Modular(t) => Slots::Modular((0..n).map(|_| rng.gen_range(0..*t)).collect()),
            Ring::Real => Slots::Real((0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()),
        }
    }

    /// Coefficients drawn from {-1, 0, 1}
    pub(crate) fn sample_ternary<R: Rng>(&self, n: usize, rng: &mut R) -> Slots {
        let draws: Vec<i64> = (0..n).map(|_| rng.gen_range(-1i64..=1)).collect();
        match self {
            Ring::Modular(t) => Slots::Modular(draws.iter().map(|d| reduce(*d, *t)).collect()),
            Ring::Real => Slots::Real(draws.iter().map(|d| *d as f64).collect()),
        }
    }

    pub(crate) fn add(&self, a: &Slots, b: &Slots) -> EngineResult<Slots> {
        match (self, a, b) {
            (Ring::Modular(t), Slots::Modular(x), Slots::Modular(y)) if x.len() == y.len() => {
                Ok(Slots::Modular(
                    x.iter().zip(y).map(|(p, q)| add_mod(*p, *q, *t)).collect(),
                ))
            }
            (Ring::Real, Slots::Real(x), Slots::Real(y)) if x.len() == y.len() => {
                Ok(Slots::Real(x.iter().zip(y).map(|(p, q)| p + q).collect()))
            }
            _ => Err(mismatch()),
        }
    }

    pub(crate) fn neg(&self, a: &Slots) -> EngineResult<Slots> {
        match (self, a) {
            (Ring::Modular(t), Slots::Modular(x)) => {
                Ok(Slots::Modular(x.iter().map(|p| (*t - p % *t) % *t).collect()))
            }
            (Ring::Real, Slots::Real(x)) => Ok(Slots::Real(x.iter().map(|p| -p).collect())),
            _ => Err(mismatch()),
        }
    }

    pub(crate) fn sub(&self, a: &Slots, b: &Slots) -> EngineResult<Slots> {
        self.add(a, &self.neg(b)?)
    }

    pub(crate) fn mul(&self, a: &Slots, b: &Slots) -> EngineResult<Slots> {
        match (self, a, b) {
            (Ring::Modular(t), Slots::Modular(x), Slots::Modular(y)) if x.len() == y.len() => {
                Ok(Slots::Modular(
                    x.iter().zip(y).map(|(p, q)| mul_mod(*p, *q, *t)).collect(),
                ))
            }
            (Ring::Real, Slots::Real(x), Slots::Real(y)) if x.len() == y.len() => {
                Ok(Slots::Real(x.iter().zip(y).map(|(p, q)| p * q).collect()))
            }
            _ => Err(mismatch()),
        }
    }

    /// Integer rings round the constant to the nearest integer first
    pub(crate) fn scale(&self, a: &Slots, constant: f64) -> EngineResult<Slots> {
        match (self, a) {
            (Ring::Modular(t), Slots::Modular(x)) => {
                let c = reduce(constant.round() as i64, *t);
                Ok(Slots::Modular(x.iter().map(|p| mul_mod(*p, c, *t)).collect()))
            }
            (Ring::Real, Slots::Real(x)) => Ok(Slots::Real(x.iter().map(|p| p * constant).collect())),
            _ => Err(mismatch()),
        }
    }

    /// Pads with zeros to `n` slots
    pub(crate) fn encode(&self, values: &PlaintextValues, n: usize) -> EngineResult<Slots> {
        if values.len() > n {
            return Err(EngineError::TooManyValues {
                given: values.len(),
                slots: n,
            });
        }
        match (self, values) {
            (Ring::Modular(t), PlaintextValues::Integer(v)) => {
                // Same range `decode` yields, so every accepted value survives
                let upper = (*t / 2) as i128;
                let lower = -(((*t - 1) / 2) as i128);
                let mut out = Vec::with_capacity(n);
                for value in v {
                    let wide = *value as i128;
                    if wide < lower || wide > upper {
                        return Err(EngineError::EncodingOverflow {
                            value: *value,
                            modulus: *t,
                        });
                    }
                    out.push(reduce(*value, *t));
                }
                out.resize(n, 0);
                Ok(Slots::Modular(out))
            }
            (Ring::Real, PlaintextValues::Real(v)) => {
                let mut out = v.clone();
                out.resize(n, 0.0);
                Ok(Slots::Real(out))
            }
            (Ring::Real, PlaintextValues::Integer(v)) => {
                let mut out: Vec<f64> = v.iter().map(|x| *x as f64).collect();
                out.resize(n, 0.0);
                Ok(Slots::Real(out))
            }
            (Ring::Modular(_), PlaintextValues::Real(_)) => Err(EngineError::Unsupported(
                "real-valued encoding requires a CKKS context".into(),
            )),
        }
    }

    /// Integer slots decode to the centered representative in (-t/2, t/2]
    pub(crate) fn decode(&self, slots: &Slots) -> EngineResult<PlaintextValues> {
        match (self, slots) {
            (Ring::Modular(t), Slots::Modular(x)) => Ok(PlaintextValues::Integer(
                x.iter().map(|v| centered(*v, *t)).collect(),
            )),
            (Ring::Real, Slots::Real(x)) => Ok(PlaintextValues::Real(x.clone())),
            _ => Err(mismatch()),
        }
    }
}

fn reduce(value: i64, t: u64) -> u64 {
    (value as i128).rem_euclid(t as i128) as u64
}

fn centered(value: u64, t: u64) -> i64 {
    if value > t / 2 {
        (value as i128 - t as i128) as i64
    } else {
        value as i64
    }
}

fn add_mod(a: u64, b: u64, t: u64) -> u64 {
    ((a as u128 + b as u128) % t as u128) as u64
}

fn mul_mod(a: u64, b: u64, t: u64) -> u64 {
    ((a as u128 * b as u128) % t as u128) as u64
}
