//! Mock HE engine for testing
//!
//! NOT SECURE - a noiseless, slot-wise toy. Every "polynomial" is a vector of
//! slot values, so a ciphertext `(c0, c1)` decrypts as `c0 + c1 * s` slot by
//! slot. Key switching, relinearization, threshold shares and re-encryption all
//! follow the shape of the real constructions, which lets the boundary layer be
//! exercised end to end without FFI overhead.

use super::slots::{Ring, Slots};
use super::{EngineError, EngineResult, HeEngine};
use crate::ids::KeyTag;
use crate::keystore::KeyRole;
use crate::objects::{
    Ciphertext, Encoding, EvalKey, KeyPair, Plaintext, PlaintextValues, PublicKey, SecretKey,
};
use crate::params::{MAX_MULTIPLICATIVE_DEPTH, SchemeFamily, SchemeParams};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const NAME: &str = "mock";
const DEFAULT_RING_DIM: u32 = 1024;

pub struct MockEngine;

#[derive(Serialize, Deserialize)]
struct PublicPayload {
    p0: Slots,
    p1: Slots,
}

#[derive(Serialize, Deserialize)]
struct SecretPayload {
    s: Slots,
}

/// Ciphertext parts; decryption evaluates `sum(parts[i] * s^i)`
#[derive(Serialize, Deserialize)]
struct CiphertextPayload {
    parts: Vec<Slots>,
}

/// Switching key satisfying `b + a * s_from = target`
#[derive(Serialize, Deserialize)]
struct SwitchPayload {
    b: Slots,
    a: Slots,
}

#[derive(Serialize, Deserialize, PartialEq)]
struct Tables {
    rotation_schedule: Vec<u32>,
    modulus_bits: u32,
}

fn encode<T: Serialize>(value: &T, what: &'static str) -> EngineResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| EngineError::MalformedPayload {
        what,
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &'static str) -> EngineResult<T> {
    bincode::deserialize(bytes).map_err(|e| EngineError::MalformedPayload {
        what,
        reason: e.to_string(),
    })
}

impl MockEngine {
    fn slots(params: &SchemeParams) -> usize {
        params.slots()
    }

    fn secret(&self, params: &SchemeParams, key: &SecretKey) -> EngineResult<Slots> {
        let payload: SecretPayload = decode(key.payload(), "secret key")?;
        self.check_len(params, &payload.s, "secret key")?;
        Ok(payload.s)
    }

    fn parts(&self, params: &SchemeParams, ct: &Ciphertext) -> EngineResult<Vec<Slots>> {
        let payload: CiphertextPayload = decode(ct.payload(), "ciphertext")?;
        if payload.parts.is_empty() {
            return Err(EngineError::MalformedPayload {
                what: "ciphertext",
                reason: "no parts".into(),
            });
        }
        for part in &payload.parts {
            self.check_len(params, part, "ciphertext")?;
        }
        Ok(payload.parts)
    }

    /// Fresh (not partially decrypted, relinearized) ciphertext parts
    fn pair(&self, params: &SchemeParams, ct: &Ciphertext) -> EngineResult<(Slots, Slots)> {
        let mut parts = self.parts(params, ct)?;
        if parts.len() != 2 {
            return Err(EngineError::Incompatible(format!(
                "expected a two-part ciphertext, found {} parts",
                parts.len()
            )));
        }
        let c1 = parts.pop();
        let c0 = parts.pop();
        match (c0, c1) {
            (Some(c0), Some(c1)) => Ok((c0, c1)),
            _ => Err(EngineError::Incompatible("missing ciphertext part".into())),
        }
    }

    fn switch_key(&self, params: &SchemeParams, key: &EvalKey) -> EngineResult<SwitchPayload> {
        let payload: SwitchPayload = decode(key.payload(), "evaluation key")?;
        self.check_len(params, &payload.a, "evaluation key")?;
        self.check_len(params, &payload.b, "evaluation key")?;
        Ok(payload)
    }

    fn check_len(&self, params: &SchemeParams, slots: &Slots, what: &'static str) -> EngineResult<()> {
        if slots.len() != Self::slots(params) {
            return Err(EngineError::MalformedPayload {
                what,
                reason: format!("{} slots, context has {}", slots.len(), Self::slots(params)),
            });
        }
        Ok(())
    }

    fn seal(&self, template: &Ciphertext, parts: Vec<Slots>) -> EngineResult<Ciphertext> {
        Ok(template.derive(encode(&CiphertextPayload { parts }, "ciphertext")?))
    }

    fn combine(
        &self,
        params: &SchemeParams,
        a: &Ciphertext,
        b: &Ciphertext,
        op: fn(&Ring, &Slots, &Slots) -> EngineResult<Slots>,
    ) -> EngineResult<Ciphertext> {
        if a.encoding() != b.encoding() {
            return Err(EngineError::Incompatible("encodings differ".into()));
        }
        let ring = Ring::for_params(params);
        let (a0, a1) = self.pair(params, a)?;
        let (b0, b1) = self.pair(params, b)?;
        let out = self.seal(a, vec![op(&ring, &a0, &b0)?, op(&ring, &a1, &b1)?])?;
        Ok(out
            .with_depth(a.depth().max(b.depth()))
            .with_level(a.level().max(b.level())))
    }

    /// Apply a switching key to the `s`-multiplied part: `c0 + c1 * b`, `c1 * a`
    fn key_switch(&self, ring: &Ring, c0: &Slots, c1: &Slots, key: &SwitchPayload) -> EngineResult<Vec<Slots>> {
        Ok(vec![
            ring.add(c0, &ring.mul(c1, &key.b)?)?,
            ring.mul(c1, &key.a)?,
        ])
    }

    fn new_key_pair(&self, params: &SchemeParams, p1: Slots, p0_base: Option<&Slots>) -> EngineResult<KeyPair> {
        let ring = Ring::for_params(params);
        let n = Self::slots(params);
        let s = ring.sample_ternary(n, &mut OsRng);
        let a_s = ring.mul(&p1, &s)?;
        let p0 = match p0_base {
            Some(base) => ring.sub(base, &a_s)?,
            None => ring.neg(&a_s)?,
        };
        let context = params.context_id();
        let tag = KeyTag::random();
        Ok(KeyPair {
            public: PublicKey::new(
                context,
                tag.clone(),
                encode(&PublicPayload { p0, p1 }, "public key")?,
            ),
            secret: SecretKey::new(context, tag, encode(&SecretPayload { s }, "secret key")?),
        })
    }

    fn rotation_schedule(params: &SchemeParams) -> Vec<u32> {
        let mut out = Vec::new();
        let mut step = 1u32;
        while step < params.batch_size {
            out.push(step);
            step <<= 1;
        }
        out
    }

    fn modulus_bits(params: &SchemeParams) -> EngineResult<u32> {
        params
            .multiplicative_depth
            .checked_mul(params.scaling_mod_size)
            .and_then(|bits| bits.checked_add(params.first_mod_size))
            .ok_or_else(|| {
                EngineError::InvalidParameters(format!(
                    "modulus chain of depth {} overflows",
                    params.multiplicative_depth
                ))
            })
    }

    fn tables(params: &SchemeParams) -> EngineResult<Tables> {
        Ok(Tables {
            rotation_schedule: Self::rotation_schedule(params),
            modulus_bits: Self::modulus_bits(params)?,
        })
    }

    /// One level past `level`, within the context's depth
    fn next_level(params: &SchemeParams, level: u32) -> EngineResult<u32> {
        match level.checked_add(1) {
            Some(next) if next <= params.multiplicative_depth => Ok(next),
            _ => Err(EngineError::DepthExhausted {
                limit: params.multiplicative_depth,
            }),
        }
    }
}

impl HeEngine for MockEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    fn resolve(&self, mut params: SchemeParams) -> EngineResult<SchemeParams> {
        if params.multiplicative_depth > MAX_MULTIPLICATIVE_DEPTH {
            return Err(EngineError::InvalidParameters(format!(
                "multiplicative depth {} exceeds {MAX_MULTIPLICATIVE_DEPTH}",
                params.multiplicative_depth
            )));
        }
        if params.family != SchemeFamily::Ckks && params.plaintext_modulus < 2 {
            return Err(EngineError::InvalidParameters(format!(
                "plaintext modulus {} is below 2",
                params.plaintext_modulus
            )));
        }
        if params.ring_dimension == 0 {
            params.ring_dimension = DEFAULT_RING_DIM;
        }
        if params.ring_dimension < 2 || !params.ring_dimension.is_power_of_two() {
            return Err(EngineError::InvalidParameters(format!(
                "ring dimension {} is not a power of two",
                params.ring_dimension
            )));
        }
        let capacity = match params.family {
            SchemeFamily::Ckks => params.ring_dimension / 2,
            SchemeFamily::Bfv | SchemeFamily::Bgv => params.ring_dimension,
        };
        if params.batch_size == 0 {
            params.batch_size = capacity;
        }
        if params.batch_size > capacity {
            return Err(EngineError::InvalidParameters(format!(
                "batch size {} exceeds {capacity} available slots",
                params.batch_size
            )));
        }
        Ok(params)
    }

    fn precompute(&self, params: &SchemeParams) -> EngineResult<Vec<u8>> {
        encode(&Self::tables(params)?, "precomputed tables")
    }

    fn check_precomputed(&self, params: &SchemeParams, tables: &[u8]) -> EngineResult<()> {
        let stored: Tables = decode(tables, "precomputed tables")?;
        if stored != Self::tables(params)? {
            return Err(EngineError::PrecomputeMismatch);
        }
        Ok(())
    }

    fn ciphertext_modulus(&self, params: &SchemeParams) -> BigUint {
        // Nominal chain: one first modulus, then one scaling modulus per level
        let one = BigUint::from(1u32);
        let first = (&one << params.first_mod_size as usize) - &one;
        let scaling = (&one << params.scaling_mod_size as usize) - &one;
        (0..params.multiplicative_depth).fold(first, |acc, _| acc * &scaling)
    }

    fn key_gen(&self, params: &SchemeParams) -> EngineResult<KeyPair> {
        let ring = Ring::for_params(params);
        let a = ring.sample_uniform(Self::slots(params), &mut OsRng);
        self.new_key_pair(params, a, None)
    }

    fn multiparty_key_gen(&self, params: &SchemeParams, joint: &PublicKey) -> EngineResult<KeyPair> {
        let base: PublicPayload = decode(joint.payload(), "public key")?;
        self.check_len(params, &base.p0, "public key")?;
        self.check_len(params, &base.p1, "public key")?;
        self.new_key_pair(params, base.p1, Some(&base.p0))
    }

    fn encode_packed(&self, params: &SchemeParams, values: &[i64]) -> EngineResult<Plaintext> {
        if params.family == SchemeFamily::Ckks {
            return Err(EngineError::Unsupported(
                "packed integer encoding requires a BFV or BGV context".into(),
            ));
        }
        let values = PlaintextValues::Integer(values.to_vec());
        // Validates range and slot count
        Ring::for_params(params).encode(&values, Self::slots(params))?;
        Ok(Plaintext::new(Encoding::Packed, values))
    }

    fn encode_ckks_packed(&self, params: &SchemeParams, values: &[f64]) -> EngineResult<Plaintext> {
        if params.family != SchemeFamily::Ckks {
            return Err(EngineError::Unsupported(
                "CKKS packed encoding requires a CKKS context".into(),
            ));
        }
        let values = PlaintextValues::Real(values.to_vec());
        Ring::for_params(params).encode(&values, Self::slots(params))?;
        Ok(Plaintext::new(Encoding::CkksPacked, values))
    }

    fn encrypt(
        &self,
        params: &SchemeParams,
        key: &PublicKey,
        plaintext: &Plaintext,
    ) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let n = Self::slots(params);
        let pk: PublicPayload = decode(key.payload(), "public key")?;
        self.check_len(params, &pk.p0, "public key")?;
        let m = ring.encode(plaintext.values(), n)?;
        let u = ring.sample_ternary(n, &mut OsRng);
        let c0 = ring.add(&ring.mul(&pk.p0, &u)?, &m)?;
        let c1 = ring.mul(&pk.p1, &u)?;
        let template = Ciphertext::new(
            key.context(),
            key.key_tag().clone(),
            plaintext.encoding(),
            n as u32,
            Vec::new(),
        );
        self.seal(&template, vec![c0, c1])
    }

    fn decrypt(
        &self,
        params: &SchemeParams,
        key: &SecretKey,
        ciphertext: &Ciphertext,
    ) -> EngineResult<Plaintext> {
        let ring = Ring::for_params(params);
        let s = self.secret(params, key)?;
        let parts = self.parts(params, ciphertext)?;
        let n = Self::slots(params);
        let mut acc = ring.zero(n);
        let mut power: Option<Slots> = None;
        for part in &parts {
            let term = match &power {
                None => part.clone(),
                Some(p) => ring.mul(part, p)?,
            };
            acc = ring.add(&acc, &term)?;
            power = Some(match power {
                None => s.clone(),
                Some(p) => ring.mul(&p, &s)?,
            });
        }
        Ok(Plaintext::new(ciphertext.encoding(), ring.decode(&acc)?))
    }

    fn eval_add(&self, params: &SchemeParams, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.combine(params, a, b, Ring::add)
    }

    fn eval_sub(&self, params: &SchemeParams, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        self.combine(params, a, b, Ring::sub)
    }

    fn eval_negate(&self, params: &SchemeParams, ciphertext: &Ciphertext) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let (c0, c1) = self.pair(params, ciphertext)?;
        self.seal(ciphertext, vec![ring.neg(&c0)?, ring.neg(&c1)?])
    }

    fn eval_mult(
        &self,
        params: &SchemeParams,
        relin_key: &EvalKey,
        a: &Ciphertext,
        b: &Ciphertext,
    ) -> EngineResult<Ciphertext> {
        let depth = Self::next_level(params, a.depth().max(b.depth()))?;
        let ring = Ring::for_params(params);
        let (a0, a1) = self.pair(params, a)?;
        let (b0, b1) = self.pair(params, b)?;
        let key = self.switch_key(params, relin_key)?;

        let d0 = ring.mul(&a0, &b0)?;
        let d1 = ring.add(&ring.mul(&a0, &b1)?, &ring.mul(&a1, &b0)?)?;
        let d2 = ring.mul(&a1, &b1)?;
        // d2 * s^2 = d2 * b + d2 * a * s
        let c0 = ring.add(&d0, &ring.mul(&d2, &key.b)?)?;
        let c1 = ring.add(&d1, &ring.mul(&d2, &key.a)?)?;
        Ok(self
            .seal(a, vec![c0, c1])?
            .with_depth(depth)
            .with_level(a.level().max(b.level())))
    }

    fn eval_mult_plain(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        plaintext: &Plaintext,
    ) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let (c0, c1) = self.pair(params, ciphertext)?;
        let m = ring.encode(plaintext.values(), Self::slots(params))?;
        self.seal(ciphertext, vec![ring.mul(&c0, &m)?, ring.mul(&c1, &m)?])
    }

    fn eval_mult_const(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        constant: f64,
    ) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let (c0, c1) = self.pair(params, ciphertext)?;
        self.seal(
            ciphertext,
            vec![ring.scale(&c0, constant)?, ring.scale(&c1, constant)?],
        )
    }

    fn eval_rotate(
        &self,
        params: &SchemeParams,
        key: &EvalKey,
        ciphertext: &Ciphertext,
    ) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let (c0, c1) = self.pair(params, ciphertext)?;
        let switch = self.switch_key(params, key)?;
        let k = key.index() as usize;
        let parts = self.key_switch(&ring, &c0.rotate(k), &c1.rotate(k), &switch)?;
        self.seal(ciphertext, parts)
    }

    fn mod_reduce(&self, params: &SchemeParams, ciphertext: &Ciphertext) -> EngineResult<Ciphertext> {
        if params.family == SchemeFamily::Bfv {
            return Err(EngineError::Unsupported(
                "modulus reduction is not defined for BFV".into(),
            ));
        }
        let level = Self::next_level(params, ciphertext.level())?;
        Ok(ciphertext.clone().with_level(level))
    }

    fn compress(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        towers: u32,
    ) -> EngineResult<Ciphertext> {
        let total = params.tower_count().ok_or_else(|| {
            EngineError::InvalidParameters(format!(
                "depth {} leaves no base tower",
                params.multiplicative_depth
            ))
        })?;
        let remaining = total.saturating_sub(ciphertext.level());
        if towers == 0 || towers > remaining {
            return Err(EngineError::InvalidParameters(format!(
                "cannot compress to {towers} towers, {remaining} remain"
            )));
        }
        self.pair(params, ciphertext)?;
        Ok(ciphertext.clone().with_level(total - towers))
    }

    fn eval_mult_key_gen(&self, params: &SchemeParams, secret: &SecretKey) -> EngineResult<EvalKey> {
        let ring = Ring::for_params(params);
        let s = self.secret(params, secret)?;
        let a = ring.sample_uniform(Self::slots(params), &mut OsRng);
        let b = ring.sub(&ring.mul(&s, &s)?, &ring.mul(&a, &s)?)?;
        Ok(EvalKey::new(
            secret.context(),
            secret.key_tag().clone(),
            KeyRole::Mult,
            0,
            encode(&SwitchPayload { b, a }, "evaluation key")?,
        ))
    }

    fn rotation_key_gen(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        role: KeyRole,
        index: u32,
        base: Option<&EvalKey>,
    ) -> EngineResult<EvalKey> {
        let ring = Ring::for_params(params);
        let s = self.secret(params, secret)?;
        let a = match base {
            Some(base) => self.switch_key(params, base)?.a,
            None => ring.sample_uniform(Self::slots(params), &mut OsRng),
        };
        let target = s.rotate(index as usize);
        let b = ring.sub(&target, &ring.mul(&a, &s)?)?;
        Ok(EvalKey::new(
            secret.context(),
            secret.key_tag().clone(),
            role,
            index,
            encode(&SwitchPayload { b, a }, "evaluation key")?,
        ))
    }

    fn check_eval_key(&self, params: &SchemeParams, key: &EvalKey) -> EngineResult<()> {
        self.switch_key(params, key).map(|_| ())
    }

    fn add_eval_keys(&self, params: &SchemeParams, a: &EvalKey, b: &EvalKey) -> EngineResult<EvalKey> {
        if a.role() != b.role() || a.index() != b.index() {
            return Err(EngineError::IncompatibleKeyShares);
        }
        let ring = Ring::for_params(params);
        let ka = self.switch_key(params, a)?;
        let kb = self.switch_key(params, b)?;
        if ka.a != kb.a {
            return Err(EngineError::IncompatibleKeyShares);
        }
        let sum = SwitchPayload {
            b: ring.add(&ka.b, &kb.b)?,
            a: ka.a,
        };
        Ok(EvalKey::new(
            a.context(),
            a.key_tag().clone(),
            a.role(),
            a.index(),
            encode(&sum, "evaluation key")?,
        ))
    }

    fn re_key_gen(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        target: &PublicKey,
    ) -> EngineResult<EvalKey> {
        // Encrypt the source secret under the target public key
        let ring = Ring::for_params(params);
        let s = self.secret(params, secret)?;
        let pk: PublicPayload = decode(target.payload(), "public key")?;
        self.check_len(params, &pk.p0, "public key")?;
        let u = ring.sample_ternary(Self::slots(params), &mut OsRng);
        let b = ring.add(&ring.mul(&pk.p0, &u)?, &s)?;
        let a = ring.mul(&pk.p1, &u)?;
        Ok(EvalKey::new(
            target.context(),
            target.key_tag().clone(),
            KeyRole::ReEncrypt,
            0,
            encode(&SwitchPayload { b, a }, "re-encryption key")?,
        ))
    }

    fn re_encrypt(
        &self,
        params: &SchemeParams,
        key: &EvalKey,
        ciphertext: &Ciphertext,
    ) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let (c0, c1) = self.pair(params, ciphertext)?;
        let switch = self.switch_key(params, key)?;
        let parts = self.key_switch(&ring, &c0, &c1, &switch)?;
        Ok(self.seal(ciphertext, parts)?.retagged(key.key_tag()))
    }

    fn multiparty_decrypt_share(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        ciphertext: &Ciphertext,
        lead: bool,
    ) -> EngineResult<Ciphertext> {
        let ring = Ring::for_params(params);
        let s = self.secret(params, secret)?;
        let (c0, c1) = self.pair(params, ciphertext)?;
        let c1s = ring.mul(&c1, &s)?;
        let share = if lead { ring.add(&c0, &c1s)? } else { c1s };
        self.seal(ciphertext, vec![share])
    }

    fn multiparty_decrypt_fusion(
        &self,
        params: &SchemeParams,
        shares: &[Ciphertext],
    ) -> EngineResult<Plaintext> {
        let Some(first) = shares.first() else {
            return Err(EngineError::Incompatible("no decryption shares".into()));
        };
        let ring = Ring::for_params(params);
        let mut acc = ring.zero(Self::slots(params));
        for share in shares {
            if share.encoding() != first.encoding() {
                return Err(EngineError::Incompatible("share encodings differ".into()));
            }
            let parts = self.parts(params, share)?;
            if parts.len() != 1 {
                return Err(EngineError::Incompatible(format!(
                    "expected a decryption share, found a {}-part ciphertext",
                    parts.len()
                )));
            }
            acc = ring.add(&acc, &parts[0])?;
        }
        Ok(Plaintext::new(first.encoding(), ring.decode(&acc)?))
    }
}
