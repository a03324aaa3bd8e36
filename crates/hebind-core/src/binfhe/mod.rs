//! Boolean-circuit (BinFHE) contexts.
//!
//! A separate object model from the packed schemes: bits are encrypted one per
//! LWE ciphertext under an LWE secret, binary gates bootstrap their result,
//! and the bootstrapping keys (refresh + switching) live on the context.
//! Nothing here touches [`crate::ContextRegistry`]; boolean contexts are not
//! interned.

mod context;
pub mod mock;

pub use context::{BinFheContext, BinFheSnapshot, BootstrapKeys};
pub use mock::MockBooleanEngine;

use crate::engine::EngineResult;
use crate::error::ConfigError;
use crate::ids::{ContextId, KeyTag};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Predefined parameter sets, with the original enum codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BinFheParamSet {
    Toy = 0,
    Medium = 1,
    Std128Ap = 2,
    Std128ApOpt = 3,
    Std128 = 4,
    Std128Opt = 5,
    Std192 = 6,
    Std192Opt = 7,
    Std256 = 8,
    Std256Opt = 9,
    Std128Q = 10,
    Std128QOpt = 11,
    Std192Q = 12,
    Std192QOpt = 13,
    Std256Q = 14,
    Std256QOpt = 15,
    SignedModTest = 16,
}

impl TryFrom<u32> for BinFheParamSet {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        use BinFheParamSet::*;
        const ALL: [BinFheParamSet; 17] = [
            Toy, Medium, Std128Ap, Std128ApOpt, Std128, Std128Opt, Std192, Std192Opt, Std256,
            Std256Opt, Std128Q, Std128QOpt, Std192Q, Std192QOpt, Std256Q, Std256QOpt,
            SignedModTest,
        ];
        ALL.get(value as usize)
            .copied()
            .ok_or(ConfigError::UnknownBinFheParamSet(value))
    }
}

impl fmt::Display for BinFheParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinFheParamSet::Toy => "TOY",
            BinFheParamSet::Medium => "MEDIUM",
            BinFheParamSet::Std128Ap => "STD128_AP",
            BinFheParamSet::Std128ApOpt => "STD128_APOPT",
            BinFheParamSet::Std128 => "STD128",
            BinFheParamSet::Std128Opt => "STD128_OPT",
            BinFheParamSet::Std192 => "STD192",
            BinFheParamSet::Std192Opt => "STD192_OPT",
            BinFheParamSet::Std256 => "STD256",
            BinFheParamSet::Std256Opt => "STD256_OPT",
            BinFheParamSet::Std128Q => "STD128Q",
            BinFheParamSet::Std128QOpt => "STD128Q_OPT",
            BinFheParamSet::Std192Q => "STD192Q",
            BinFheParamSet::Std192QOpt => "STD192Q_OPT",
            BinFheParamSet::Std256Q => "STD256Q",
            BinFheParamSet::Std256QOpt => "STD256Q_OPT",
            BinFheParamSet::SignedModTest => "SIGNED_MOD_TEST",
        };
        f.write_str(name)
    }
}

/// Bootstrapping method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum BinFheMethod {
    Ap = 1,
    #[default]
    Ginx = 2,
}

impl TryFrom<u32> for BinFheMethod {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Ap),
            2 => Ok(Self::Ginx),
            other => Err(ConfigError::UnknownBinFheMethod(other)),
        }
    }
}

impl fmt::Display for BinFheMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinFheMethod::Ap => f.write_str("AP"),
            BinFheMethod::Ginx => f.write_str("GINX"),
        }
    }
}

/// Two-input gates evaluated with one bootstrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BinGate {
    Or = 0,
    And = 1,
    Nor = 2,
    Nand = 3,
    XorFast = 4,
    XnorFast = 5,
    Xor = 6,
    Xnor = 7,
}

impl BinGate {
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            BinGate::Or => a | b,
            BinGate::And => a & b,
            BinGate::Nor => !(a | b),
            BinGate::Nand => !(a & b),
            BinGate::Xor | BinGate::XorFast => a ^ b,
            BinGate::Xnor | BinGate::XnorFast => !(a ^ b),
        }
    }
}

impl TryFrom<u32> for BinGate {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Or),
            1 => Ok(Self::And),
            2 => Ok(Self::Nor),
            3 => Ok(Self::Nand),
            4 => Ok(Self::XorFast),
            5 => Ok(Self::XnorFast),
            6 => Ok(Self::Xor),
            7 => Ok(Self::Xnor),
            other => Err(ConfigError::UnknownBinGate(other)),
        }
    }
}

impl fmt::Display for BinGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinGate::Or => "OR",
            BinGate::And => "AND",
            BinGate::Nor => "NOR",
            BinGate::Nand => "NAND",
            BinGate::XorFast => "XOR_FAST",
            BinGate::XnorFast => "XNOR_FAST",
            BinGate::Xor => "XOR",
            BinGate::Xnor => "XNOR",
        };
        f.write_str(name)
    }
}

/// Messages live in Z_4; gates take and produce bits
pub const BINFHE_PLAINTEXT_MODULUS: u64 = 4;

/// LWE and RingGSW parameters of a boolean context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinFheParams {
    /// LWE lattice dimension `n`
    pub lattice_dim: u32,
    /// RingGSW ring dimension `N`
    pub ring_dim: u32,
    /// LWE modulus `q`
    pub modulus: u64,
    /// RingGSW modulus `Q`
    pub ring_modulus: u64,
    /// Key-switching modulus
    pub key_switch_modulus: u64,
    pub std_dev: f64,
    pub base_ks: u32,
    pub base_g: u32,
    pub base_r: u32,
    pub method: BinFheMethod,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

impl BinFheParams {
    /// Structural checks every engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lattice_dim == 0 {
            return Err(invalid("lattice_dim", "must be positive"));
        }
        if !self.ring_dim.is_power_of_two() || self.ring_dim < 2 {
            return Err(invalid("ring_dim", format!("{} is not a power of two", self.ring_dim)));
        }
        if self.lattice_dim > self.ring_dim {
            return Err(invalid(
                "lattice_dim",
                format!("{} exceeds ring dimension {}", self.lattice_dim, self.ring_dim),
            ));
        }
        if self.modulus < BINFHE_PLAINTEXT_MODULUS || self.modulus % BINFHE_PLAINTEXT_MODULUS != 0 {
            return Err(invalid(
                "modulus",
                format!("{} is not a positive multiple of {BINFHE_PLAINTEXT_MODULUS}", self.modulus),
            ));
        }
        if self.ring_modulus < self.modulus {
            return Err(invalid("ring_modulus", "must not be smaller than the LWE modulus"));
        }
        if self.key_switch_modulus == 0 {
            return Err(invalid("key_switch_modulus", "must be positive"));
        }
        if !self.std_dev.is_finite() || self.std_dev <= 0.0 {
            return Err(invalid("std_dev", format!("{} is not a positive number", self.std_dev)));
        }
        for (field, base) in [("base_ks", self.base_ks), ("base_g", self.base_g), ("base_r", self.base_r)] {
            if base < 2 {
                return Err(invalid(field, format!("{base} is below 2")));
            }
        }
        Ok(())
    }

    pub fn context_id(&self) -> ContextId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"hebind-binfhe-context-v1");
        hasher.update(&self.lattice_dim.to_le_bytes());
        hasher.update(&self.ring_dim.to_le_bytes());
        hasher.update(&self.modulus.to_le_bytes());
        hasher.update(&self.ring_modulus.to_le_bytes());
        hasher.update(&self.key_switch_modulus.to_le_bytes());
        hasher.update(&self.std_dev.to_bits().to_le_bytes());
        hasher.update(&self.base_ks.to_le_bytes());
        hasher.update(&self.base_g.to_le_bytes());
        hasher.update(&self.base_r.to_le_bytes());
        hasher.update(&(self.method as u32).to_le_bytes());
        ContextId::from_bytes(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for BinFheParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} N={} q={} Q={} method={}",
            self.lattice_dim, self.ring_dim, self.modulus, self.ring_modulus, self.method
        )
    }
}

/// LWE secret (dimension `n`), or a ring secret (dimension `N`) from `KeyGenN`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LwePrivateKey {
    #[zeroize(skip)]
    context: ContextId,
    #[zeroize(skip)]
    key_tag: KeyTag,
    dimension: u32,
    #[serde(with = "crate::payload")]
    payload: Vec<u8>,
}

impl LwePrivateKey {
    pub fn new(context: ContextId, key_tag: KeyTag, dimension: u32, payload: Vec<u8>) -> Self {
        Self {
            context,
            key_tag,
            dimension,
            payload,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn key_tag(&self) -> &KeyTag {
        &self.key_tag
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Debug for LwePrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LwePrivateKey")
            .field("context", &self.context)
            .field("key_tag", &self.key_tag)
            .field("dimension", &self.dimension)
            .field("payload", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for LwePrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LWEPrivateKey(tag={}, n={}, context={})",
            self.key_tag, self.dimension, self.context
        )
    }
}

macro_rules! lwe_object {
    ($(#[$doc:meta])* $name:ident, $shown:literal) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            context: ContextId,
            key_tag: KeyTag,
            #[serde(with = "crate::payload")]
            payload: Vec<u8>,
        }

        impl $name {
            pub fn new(context: ContextId, key_tag: KeyTag, payload: Vec<u8>) -> Self {
                Self {
                    context,
                    key_tag,
                    payload,
                }
            }

            pub fn context(&self) -> ContextId {
                self.context
            }

            /// Tag of the LWE secret this object is bound to
            pub fn key_tag(&self) -> &KeyTag {
                &self.key_tag
            }

            pub fn payload(&self) -> &[u8] {
                &self.payload
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!($shown, "(tag={}, context={}, {} bytes)"),
                    self.key_tag,
                    self.context,
                    self.payload.len()
                )
            }
        }
    };
}

lwe_object!(
    /// One encrypted bit
    LweCiphertext,
    "LWECiphertext"
);
lwe_object!(
    /// RingGSW accumulator key used to refresh ciphertexts
    RefreshKey,
    "RingGSWACCKey"
);
lwe_object!(
    /// Key switching from the ring secret back to the LWE secret
    SwitchingKey,
    "LWESwitchingKey"
);

/// Boolean-circuit engine
///
/// Object-safe like [`crate::HeEngine`]. The context checks key tags and
/// context bindings before it calls in here.
pub trait BooleanEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Parameters behind a predefined set
    fn preset(&self, set: BinFheParamSet, method: BinFheMethod) -> EngineResult<BinFheParams>;

    /// Engine-specific checks on top of [`BinFheParams::validate`]
    fn check_params(&self, params: &BinFheParams) -> EngineResult<()>;

    /// Secret of the given dimension (`n` for LWE, `N` for the ring secret)
    fn key_gen(&self, params: &BinFheParams, context: ContextId, dimension: u32) -> EngineResult<LwePrivateKey>;

    /// Switching key from `ring_secret` to `secret`
    fn key_switch_gen(
        &self,
        params: &BinFheParams,
        secret: &LwePrivateKey,
        ring_secret: &LwePrivateKey,
    ) -> EngineResult<SwitchingKey>;

    /// Refresh key for `ring_secret`, tagged with the LWE secret it serves
    fn refresh_key_gen(
        &self,
        params: &BinFheParams,
        secret: &LwePrivateKey,
        ring_secret: &LwePrivateKey,
    ) -> EngineResult<RefreshKey>;

    /// Checks that a refresh and switching key were generated together
    fn check_bootstrap_keys(&self, params: &BinFheParams, keys: &BootstrapKeys) -> EngineResult<()>;

    fn encrypt(&self, params: &BinFheParams, secret: &LwePrivateKey, message: u64) -> EngineResult<LweCiphertext>;

    fn decrypt(&self, params: &BinFheParams, secret: &LwePrivateKey, ciphertext: &LweCiphertext) -> EngineResult<u64>;

    /// Negation without bootstrapping
    fn eval_not(&self, params: &BinFheParams, ciphertext: &LweCiphertext) -> EngineResult<LweCiphertext>;

    fn eval_bin_gate(
        &self,
        params: &BinFheParams,
        keys: &BootstrapKeys,
        gate: BinGate,
        a: &LweCiphertext,
        b: &LweCiphertext,
    ) -> EngineResult<LweCiphertext>;

    fn bootstrap(
        &self,
        params: &BinFheParams,
        keys: &BootstrapKeys,
        ciphertext: &LweCiphertext,
    ) -> EngineResult<LweCiphertext>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_codes() {
        assert_eq!(BinFheParamSet::try_from(4).unwrap(), BinFheParamSet::Std128);
        assert_eq!(BinFheParamSet::try_from(16).unwrap(), BinFheParamSet::SignedModTest);
        assert_eq!(
            BinFheParamSet::try_from(17).unwrap_err(),
            ConfigError::UnknownBinFheParamSet(17)
        );
        assert_eq!(BinFheMethod::try_from(2).unwrap(), BinFheMethod::Ginx);
        assert_eq!(BinFheMethod::try_from(0).unwrap_err(), ConfigError::UnknownBinFheMethod(0));
        assert_eq!(BinGate::try_from(1).unwrap(), BinGate::And);
        assert_eq!(BinGate::try_from(8).unwrap_err(), ConfigError::UnknownBinGate(8));
        assert_eq!(BinGate::XnorFast.to_string(), "XNOR_FAST");
    }

    #[test]
    fn test_gate_truth_tables() {
        let rows = [(false, false), (false, true), (true, false), (true, true)];
        let table = |gate: BinGate| rows.map(|(a, b)| gate.apply(a, b));
        assert_eq!(table(BinGate::And), [false, false, false, true]);
        assert_eq!(table(BinGate::Or), [false, true, true, true]);
        assert_eq!(table(BinGate::Nand), [true, true, true, false]);
        assert_eq!(table(BinGate::Nor), [true, false, false, false]);
        assert_eq!(table(BinGate::Xor), table(BinGate::XorFast));
        assert_eq!(table(BinGate::Xnor), [true, false, false, true]);
    }

    fn toy() -> BinFheParams {
        BinFheParams {
            lattice_dim: 16,
            ring_dim: 64,
            modulus: 512,
            ring_modulus: 1 << 20,
            key_switch_modulus: 1 << 10,
            std_dev: 3.19,
            base_ks: 25,
            base_g: 1 << 5,
            base_r: 23,
            method: BinFheMethod::Ginx,
        }
    }

    #[test]
    fn test_validate_params() {
        assert!(toy().validate().is_ok());

        let mut p = toy();
        p.ring_dim = 48;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidValue { field: "ring_dim", .. })));

        let mut p = toy();
        p.lattice_dim = 128;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidValue { field: "lattice_dim", .. })));

        let mut p = toy();
        p.modulus = 514;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidValue { field: "modulus", .. })));

        let mut p = toy();
        p.std_dev = f64::NAN;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidValue { field: "std_dev", .. })));

        let mut p = toy();
        p.base_g = 1;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidValue { field: "base_g", .. })));
    }

    #[test]
    fn test_context_id_follows_every_parameter() {
        let base = toy().context_id();
        assert_eq!(base, toy().context_id());

        let mut p = toy();
        p.method = BinFheMethod::Ap;
        assert_ne!(p.context_id(), base);

        let mut p = toy();
        p.std_dev = 3.2;
        assert_ne!(p.context_id(), base);
    }
}
