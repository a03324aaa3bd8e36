//! # hebind-core: context facade for homomorphic-encryption bindings
//!
//! Owns everything between a foreign caller and an HE engine except handles
//! and wire formats:
//!
//! - **Parameter assembly**: BFV, BGV and CKKS builders behind [`ParameterOptions`]
//! - **Context facade**: feature gating, key-tag checks and every scheme verb on [`CryptoContext`]
//! - **Key-material store**: per-role evaluation key maps with threshold merge
//! - **Engine contract**: the object-safe [`HeEngine`] trait, plus [`MockEngine`] for testing
//! - **Boolean circuits**: [`BinFheContext`] over a [`BooleanEngine`], with bootstrapped binary gates
//!
//! ## Example: BGV addition
//!
//! ```rust
//! use hebind_core::{ContextRegistry, Feature, MockEngine, ParameterOptions, ParameterSet, SchemeFamily};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut params = ParameterSet::new(SchemeFamily::Bgv);
//! params.options_mut().set_plaintext_modulus(65537)?;
//! params.options_mut().set_multiplicative_depth(2)?;
//!
//! let registry = ContextRegistry::new();
//! let ctx = registry.gen_context(&params, Arc::new(MockEngine))?;
//! ctx.enable(Feature::Pke);
//! ctx.enable(Feature::LeveledShe);
//!
//! let kp = ctx.key_gen()?;
//! let pt = ctx.make_packed_plaintext(&[1, 2, 3])?;
//! let ct = ctx.encrypt(&kp.public, &pt)?;
//! let sum = ctx.eval_add(&ct, &ct)?;
//!
//! let mut out = ctx.decrypt(&kp.secret, &sum)?;
//! out.set_length(3);
//! assert_eq!(out.packed_value()?, &[2, 4, 6]);
//! # Ok(())
//! # }
//! ```

pub mod binfhe;
pub mod context;
pub mod engine;
pub mod error;
pub mod features;
pub mod ids;
pub mod keystore;
pub mod objects;
pub mod params;
mod payload;
pub mod registry;

pub use binfhe::{
    BinFheContext, BinFheMethod, BinFheParamSet, BinFheParams, BinFheSnapshot, BinGate, BooleanEngine,
    BootstrapKeys, LweCiphertext, LwePrivateKey, MockBooleanEngine, RefreshKey, SwitchingKey,
};
pub use context::{ContextSnapshot, ContextState, CryptoContext, Precomputed};
pub use engine::{EngineError, EngineResult, HeEngine, MockEngine};
pub use error::{ConfigError, CoreError, CoreResult, PreconditionError};
pub use features::{Feature, FeatureSet};
pub use ids::{ContextId, KeyTag};
pub use keystore::{EvalKeyMap, KeyMaterialStore, KeyRole, merge_maps};
pub use objects::{
    Ciphertext, Encoding, EvalKey, KeyPair, Plaintext, PlaintextValues, PublicKey, SecretKey,
};
pub use params::{
    BfvParams, BgvParams, CkksParams, KeySwitchTechnique, MAX_MULTIPLICATIVE_DEPTH, ParameterOptions,
    ParameterSet, ScalingTechnique, SchemeFamily, SchemeParams, SecurityLevel,
};
pub use registry::ContextRegistry;

pub use num_bigint::BigUint;
