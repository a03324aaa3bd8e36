//! Contract between the boundary layer and a homomorphic-encryption engine.
//!
//! The facade validates features, key tags and cached key material before it
//! calls in here; an engine only sees well-formed requests and reports
//! cryptographic failures through [`EngineError`].

pub mod mock;
mod slots;

pub use mock::MockEngine;

use crate::keystore::KeyRole;
use crate::objects::{Ciphertext, EvalKey, KeyPair, Plaintext, PublicKey, SecretKey};
use crate::params::SchemeParams;
use num_bigint::BigUint;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Malformed {what} payload: {reason}")]
    MalformedPayload { what: &'static str, reason: String },

    #[error("Value {value} cannot be encoded with plaintext modulus {modulus}")]
    EncodingOverflow { value: i64, modulus: u64 },

    #[error("{given} values exceed the {slots} available slots")]
    TooManyValues { given: usize, slots: usize },

    #[error("Multiplicative depth exhausted (limit {limit})")]
    DepthExhausted { limit: u32 },

    #[error("Operands are incompatible: {0}")]
    Incompatible(String),

    #[error("Key shares were not generated from the same base key")]
    IncompatibleKeyShares,

    #[error("Precomputed tables do not match the context parameters")]
    PrecomputeMismatch,

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Homomorphic-encryption engine
///
/// Object-safe so contexts can hold `Arc<dyn HeEngine>`.
pub trait HeEngine: Send + Sync {
    /// Short identifier recorded in serialized contexts
    fn name(&self) -> &'static str;

    /// Fill engine-chosen values (ring dimension, batch size) and validate
    fn resolve(&self, params: SchemeParams) -> EngineResult<SchemeParams>;

    /// Tables an engine derives from the parameters (e.g. rotation schedules)
    fn precompute(&self, params: &SchemeParams) -> EngineResult<Vec<u8>>;

    fn check_precomputed(&self, params: &SchemeParams, tables: &[u8]) -> EngineResult<()>;

    /// Full ciphertext modulus
    fn ciphertext_modulus(&self, params: &SchemeParams) -> BigUint;

    fn key_gen(&self, params: &SchemeParams) -> EngineResult<KeyPair>;

    /// Next party's key pair, extending a joint public key
    fn multiparty_key_gen(&self, params: &SchemeParams, joint: &PublicKey) -> EngineResult<KeyPair>;

    fn encode_packed(&self, params: &SchemeParams, values: &[i64]) -> EngineResult<Plaintext>;

    fn encode_ckks_packed(&self, params: &SchemeParams, values: &[f64]) -> EngineResult<Plaintext>;

    fn encrypt(
        &self,
        params: &SchemeParams,
        key: &PublicKey,
        plaintext: &Plaintext,
    ) -> EngineResult<Ciphertext>;

    fn decrypt(
        &self,
        params: &SchemeParams,
        key: &SecretKey,
        ciphertext: &Ciphertext,
    ) -> EngineResult<Plaintext>;

    fn eval_add(&self, params: &SchemeParams, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext>;

    fn eval_sub(&self, params: &SchemeParams, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext>;

    fn eval_negate(&self, params: &SchemeParams, ciphertext: &Ciphertext) -> EngineResult<Ciphertext>;

    fn eval_mult(
        &self,
        params: &SchemeParams,
        relin_key: &EvalKey,
        a: &Ciphertext,
        b: &Ciphertext,
    ) -> EngineResult<Ciphertext>;

    fn eval_mult_plain(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        plaintext: &Plaintext,
    ) -> EngineResult<Ciphertext>;

    fn eval_mult_const(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        constant: f64,
    ) -> EngineResult<Ciphertext>;

    /// Left rotation by the key's index
    fn eval_rotate(
        &self,
        params: &SchemeParams,
        key: &EvalKey,
        ciphertext: &Ciphertext,
    ) -> EngineResult<Ciphertext>;

    fn mod_reduce(&self, params: &SchemeParams, ciphertext: &Ciphertext) -> EngineResult<Ciphertext>;

    /// Drop towers until `towers` remain
    fn compress(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        towers: u32,
    ) -> EngineResult<Ciphertext>;

    fn eval_mult_key_gen(&self, params: &SchemeParams, secret: &SecretKey) -> EngineResult<EvalKey>;

    /// Rotation or summation key for `index`. With `base`, produces this
    /// party's share of a joint key whose public part comes from `base`.
    fn rotation_key_gen(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        role: KeyRole,
        index: u32,
        base: Option<&EvalKey>,
    ) -> EngineResult<EvalKey>;

    /// Checks that a key received from elsewhere fits these parameters
    fn check_eval_key(&self, params: &SchemeParams, key: &EvalKey) -> EngineResult<()>;

    /// Combine two shares of the same joint key
    fn add_eval_keys(&self, params: &SchemeParams, a: &EvalKey, b: &EvalKey) -> EngineResult<EvalKey>;

    fn re_key_gen(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        target: &PublicKey,
    ) -> EngineResult<EvalKey>;

    fn re_encrypt(
        &self,
        params: &SchemeParams,
        key: &EvalKey,
        ciphertext: &Ciphertext,
    ) -> EngineResult<Ciphertext>;

    /// One party's partial decryption. Exactly one party runs with `lead`.
    fn multiparty_decrypt_share(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        ciphertext: &Ciphertext,
        lead: bool,
    ) -> EngineResult<Ciphertext>;

    fn multiparty_decrypt_fusion(
        &self,
        params: &SchemeParams,
        shares: &[Ciphertext],
    ) -> EngineResult<Plaintext>;
}
