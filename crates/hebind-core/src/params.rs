//! Parameter assembly for the three scheme families.
//!
//! `BfvParams`, `BgvParams` and `CkksParams` are mutable builders behind one
//! capability trait, [`ParameterOptions`]. Context construction copies them into
//! a frozen [`SchemeParams`], so later mutation never reaches a live context.

use crate::error::ConfigError;
use crate::ids::ContextId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeFamily {
    #[serde(rename = "bfv")]
    Bfv,
    #[serde(rename = "bgv")]
    Bgv,
    #[serde(rename = "ckks")]
    Ckks,
}

impl SchemeFamily {
    fn code(self) -> u8 {
        match self {
            SchemeFamily::Bfv => 0,
            SchemeFamily::Bgv => 1,
            SchemeFamily::Ckks => 2,
        }
    }
}

impl fmt::Display for SchemeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeFamily::Bfv => write!(f, "BFVRNS"),
            SchemeFamily::Bgv => write!(f, "BGVRNS"),
            SchemeFamily::Ckks => write!(f, "CKKSRNS"),
        }
    }
}

impl std::str::FromStr for SchemeFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bfv" | "bfvrns" => Ok(SchemeFamily::Bfv),
            "bgv" | "bgvrns" => Ok(SchemeFamily::Bgv),
            "ckks" | "ckksrns" => Ok(SchemeFamily::Ckks),
            other => Err(ConfigError::UnknownScheme(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum SecurityLevel {
    #[default]
    Classic128 = 0,
    Classic192 = 1,
    Classic256 = 2,
    Quantum128 = 3,
    Quantum192 = 4,
    Quantum256 = 5,
    NotSet = 6,
}

impl TryFrom<u32> for SecurityLevel {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Classic128),
            1 => Ok(Self::Classic192),
            2 => Ok(Self::Classic256),
            3 => Ok(Self::Quantum128),
            4 => Ok(Self::Quantum192),
            5 => Ok(Self::Quantum256),
            6 => Ok(Self::NotSet),
            other => Err(ConfigError::UnknownSecurityLevel(other)),
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityLevel::Classic128 => "HEStd_128_classic",
            SecurityLevel::Classic192 => "HEStd_192_classic",
            SecurityLevel::Classic256 => "HEStd_256_classic",
            SecurityLevel::Quantum128 => "HEStd_128_quantum",
            SecurityLevel::Quantum192 => "HEStd_192_quantum",
            SecurityLevel::Quantum256 => "HEStd_256_quantum",
            SecurityLevel::NotSet => "HEStd_NotSet",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ScalingTechnique {
    FixedManual = 0,
    FixedAuto = 1,
    FlexibleAuto = 2,
    FlexibleAutoExt = 3,
    NoRescale = 4,
}

impl TryFrom<u32> for ScalingTechnique {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::FixedManual),
            1 => Ok(Self::FixedAuto),
            2 => Ok(Self::FlexibleAuto),
            3 => Ok(Self::FlexibleAutoExt),
            4 => Ok(Self::NoRescale),
            other => Err(ConfigError::UnknownScalingTechnique(other)),
        }
    }
}

impl fmt::Display for ScalingTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalingTechnique::FixedManual => "FIXEDMANUAL",
            ScalingTechnique::FixedAuto => "FIXEDAUTO",
            ScalingTechnique::FlexibleAuto => "FLEXIBLEAUTO",
            ScalingTechnique::FlexibleAutoExt => "FLEXIBLEAUTOEXT",
            ScalingTechnique::NoRescale => "NORESCALE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum KeySwitchTechnique {
    Bv = 1,
    #[default]
    Hybrid = 2,
}

impl TryFrom<u32> for KeySwitchTechnique {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Bv),
            2 => Ok(Self::Hybrid),
            other => Err(ConfigError::UnknownKeySwitchTechnique(other)),
        }
    }
}

impl fmt::Display for KeySwitchTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySwitchTechnique::Bv => write!(f, "BV"),
            KeySwitchTechnique::Hybrid => write!(f, "HYBRID"),
        }
    }
}

/// Capability surface shared by every parameter builder
pub trait ParameterOptions {
    fn family(&self) -> SchemeFamily;

    /// `None` for families without a plaintext modulus (CKKS)
    fn plaintext_modulus(&self) -> Option<u64>;
    fn set_plaintext_modulus(&mut self, modulus: u64) -> Result<(), ConfigError>;

    fn multiplicative_depth(&self) -> u32;
    fn set_multiplicative_depth(&mut self, depth: u32) -> Result<(), ConfigError>;

    fn security_level(&self) -> SecurityLevel;
    fn set_security_level(&mut self, level: SecurityLevel);

    /// Zero means "let the engine choose"
    fn ring_dim(&self) -> u32;
    fn set_ring_dim(&mut self, ring_dim: u32) -> Result<(), ConfigError>;

    fn scaling_mod_size(&self) -> u32;
    fn set_scaling_mod_size(&mut self, bits: u32) -> Result<(), ConfigError>;

    /// Zero means "all available slots"
    fn batch_size(&self) -> u32;
    fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError>;

    fn scaling_technique(&self) -> ScalingTechnique;
    fn set_scaling_technique(&mut self, technique: ScalingTechnique) -> Result<(), ConfigError>;

    fn key_switch_technique(&self) -> KeySwitchTechnique;
    fn set_key_switch_technique(&mut self, technique: KeySwitchTechnique);
}

fn check_power_of_two(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value == 0 || value.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is not a power of two"),
        })
    }
}

fn check_modulus_bits(field: &'static str, bits: u32) -> Result<(), ConfigError> {
    if (1..=64).contains(&bits) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{bits} bits is outside 1..=64"),
        })
    }
}

/// Deepest modulus chain a builder accepts
pub const MAX_MULTIPLICATIVE_DEPTH: u32 = 64;

pub(crate) fn check_multiplicative_depth(depth: u32) -> Result<(), ConfigError> {
    if depth > MAX_MULTIPLICATIVE_DEPTH {
        return Err(ConfigError::InvalidValue {
            field: "multiplicative_depth",
            reason: format!("{depth} exceeds {MAX_MULTIPLICATIVE_DEPTH}"),
        });
    }
    Ok(())
}

fn check_plaintext_modulus(modulus: u64) -> Result<(), ConfigError> {
    if modulus < 2 {
        return Err(ConfigError::InvalidValue {
            field: "plaintext_modulus",
            reason: format!("{modulus} is below 2"),
        });
    }
    Ok(())
}

/// Fields every family carries
#[derive(Debug, Clone, PartialEq, Eq)]
struct Common {
    multiplicative_depth: u32,
    security_level: SecurityLevel,
    ring_dim: u32,
    batch_size: u32,
    key_switch_technique: KeySwitchTechnique,
}

impl Default for Common {
    fn default() -> Self {
        Self {
            multiplicative_depth: 1,
            security_level: SecurityLevel::Classic128,
            ring_dim: 0,
            batch_size: 0,
            key_switch_technique: KeySwitchTechnique::Hybrid,
        }
    }
}

/// Integer-arithmetic schemes encode into Z_t
#[derive(Debug, Clone, PartialEq, Eq)]
struct IntegerEncoding {
    plaintext_modulus: u64,
    scaling_mod_size: u32,
    scaling_technique: ScalingTechnique,
}

/// BFV builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfvParams {
    common: Common,
    encoding: IntegerEncoding,
}

impl Default for BfvParams {
    fn default() -> Self {
        Self {
            common: Common::default(),
            encoding: IntegerEncoding {
                plaintext_modulus: 65537,
                scaling_mod_size: 60,
                scaling_technique: ScalingTechnique::NoRescale,
            },
        }
    }
}

/// BGV builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgvParams {
    common: Common,
    encoding: IntegerEncoding,
}

impl Default for BgvParams {
    fn default() -> Self {
        Self {
            common: Common::default(),
            encoding: IntegerEncoding {
                plaintext_modulus: 65537,
                scaling_mod_size: 60,
                scaling_technique: ScalingTechnique::FlexibleAutoExt,
            },
        }
    }
}

/// CKKS builder. Approximate arithmetic has no plaintext modulus but carries
/// a separate size for the first modulus in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CkksParams {
    common: Common,
    scaling_mod_size: u32,
    first_mod_size: u32,
    scaling_technique: ScalingTechnique,
}

impl Default for CkksParams {
    fn default() -> Self {
        Self {
            common: Common::default(),
            scaling_mod_size: 50,
            first_mod_size: 60,
            scaling_technique: ScalingTechnique::FlexibleAutoExt,
        }
    }
}

impl CkksParams {
    pub fn first_mod_size(&self) -> u32 {
        self.first_mod_size
    }

    pub fn set_first_mod_size(&mut self, bits: u32) -> Result<(), ConfigError> {
        check_modulus_bits("first_mod_size", bits)?;
        self.first_mod_size = bits;
        Ok(())
    }
}

macro_rules! common_options {
    () => {
        fn multiplicative_depth(&self) -> u32 {
            self.common.multiplicative_depth
        }

        fn set_multiplicative_depth(&mut self, depth: u32) -> Result<(), ConfigError> {
            check_multiplicative_depth(depth)?;
            self.common.multiplicative_depth = depth;
            Ok(())
        }

        fn security_level(&self) -> SecurityLevel {
            self.common.security_level
        }

        fn set_security_level(&mut self, level: SecurityLevel) {
            self.common.security_level = level;
        }

        fn ring_dim(&self) -> u32 {
            self.common.ring_dim
        }

        fn set_ring_dim(&mut self, ring_dim: u32) -> Result<(), ConfigError> {
            check_power_of_two("ring_dim", ring_dim)?;
            self.common.ring_dim = ring_dim;
            Ok(())
        }

        fn batch_size(&self) -> u32 {
            self.common.batch_size
        }

        fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
            check_power_of_two("batch_size", batch_size)?;
            self.common.batch_size = batch_size;
            Ok(())
        }

        fn key_switch_technique(&self) -> KeySwitchTechnique {
            self.common.key_switch_technique
        }

        fn set_key_switch_technique(&mut self, technique: KeySwitchTechnique) {
            self.common.key_switch_technique = technique;
        }
    };
}

macro_rules! integer_encoding_options {
    () => {
        fn plaintext_modulus(&self) -> Option<u64> {
            Some(self.encoding.plaintext_modulus)
        }

        fn set_plaintext_modulus(&mut self, modulus: u64) -> Result<(), ConfigError> {
            check_plaintext_modulus(modulus)?;
            self.encoding.plaintext_modulus = modulus;
            Ok(())
        }

        fn scaling_mod_size(&self) -> u32 {
            self.encoding.scaling_mod_size
        }

        fn set_scaling_mod_size(&mut self, bits: u32) -> Result<(), ConfigError> {
            check_modulus_bits("scaling_mod_size", bits)?;
            self.encoding.scaling_mod_size = bits;
            Ok(())
        }

        fn scaling_technique(&self) -> ScalingTechnique {
            self.encoding.scaling_technique
        }
    };
}

impl ParameterOptions for BfvParams {
    fn family(&self) -> SchemeFamily {
        SchemeFamily::Bfv
    }

    common_options!();
    integer_encoding_options!();

    fn set_scaling_technique(&mut self, technique: ScalingTechnique) -> Result<(), ConfigError> {
        match technique {
            ScalingTechnique::FixedManual | ScalingTechnique::NoRescale => {
                self.encoding.scaling_technique = technique;
                Ok(())
            }
            _ => Err(ConfigError::Unsupported {
                field: "rescaling scaling technique",
                scheme: SchemeFamily::Bfv,
            }),
        }
    }
}

impl ParameterOptions for BgvParams {
    fn family(&self) -> SchemeFamily {
        SchemeFamily::Bgv
    }

    common_options!();
    integer_encoding_options!();

    fn set_scaling_technique(&mut self, technique: ScalingTechnique) -> Result<(), ConfigError> {
        if technique == ScalingTechnique::NoRescale {
            return Err(ConfigError::Unsupported {
                field: "NORESCALE scaling technique",
                scheme: SchemeFamily::Bgv,
            });
        }
        self.encoding.scaling_technique = technique;
        Ok(())
    }
}

impl ParameterOptions for CkksParams {
    fn family(&self) -> SchemeFamily {
        SchemeFamily::Ckks
    }

    common_options!();

    fn plaintext_modulus(&self) -> Option<u64> {
        None
    }

    fn set_plaintext_modulus(&mut self, _modulus: u64) -> Result<(), ConfigError> {
        Err(ConfigError::Unsupported {
            field: "plaintext modulus",
            scheme: SchemeFamily::Ckks,
        })
    }

    fn scaling_mod_size(&self) -> u32 {
        self.scaling_mod_size
    }

    fn set_scaling_mod_size(&mut self, bits: u32) -> Result<(), ConfigError> {
        check_modulus_bits("scaling_mod_size", bits)?;
        self.scaling_mod_size = bits;
        Ok(())
    }

    fn scaling_technique(&self) -> ScalingTechnique {
        self.scaling_technique
    }

    fn set_scaling_technique(&mut self, technique: ScalingTechnique) -> Result<(), ConfigError> {
        if technique == ScalingTechnique::NoRescale {
            return Err(ConfigError::Unsupported {
                field: "NORESCALE scaling technique",
                scheme: SchemeFamily::Ckks,
            });
        }
        self.scaling_technique = technique;
        Ok(())
    }
}

/// Closed union of the three builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSet {
    Bfv(BfvParams),
    Bgv(BgvParams),
    Ckks(CkksParams),
}

impl ParameterSet {
    pub fn new(family: SchemeFamily) -> Self {
        match family {
            SchemeFamily::Bfv => ParameterSet::Bfv(BfvParams::default()),
            SchemeFamily::Bgv => ParameterSet::Bgv(BgvParams::default()),
            SchemeFamily::Ckks => ParameterSet::Ckks(CkksParams::default()),
        }
    }

    pub fn options(&self) -> &dyn ParameterOptions {
        match self {
            ParameterSet::Bfv(p) => p,
            ParameterSet::Bgv(p) => p,
            ParameterSet::Ckks(p) => p,
        }
    }

    pub fn options_mut(&mut self) -> &mut dyn ParameterOptions {
        match self {
            ParameterSet::Bfv(p) => p,
            ParameterSet::Bgv(p) => p,
            ParameterSet::Ckks(p) => p,
        }
    }

    /// CKKS only; other families report `Unsupported`.
    pub fn set_first_mod_size(&mut self, bits: u32) -> Result<(), ConfigError> {
        match self {
            ParameterSet::Ckks(p) => p.set_first_mod_size(bits),
            other => Err(ConfigError::Unsupported {
                field: "first modulus size",
                scheme: other.options().family(),
            }),
        }
    }

    /// Copy the builder into an unresolved snapshot. Zero-valued ring dimension
    /// and batch size are left for the engine to fill in.
    pub fn to_scheme_params(&self) -> SchemeParams {
        let opts = self.options();
        let first_mod_size = match self {
            ParameterSet::Ckks(p) => p.first_mod_size,
            _ => opts.scaling_mod_size(),
        };
        SchemeParams {
            family: opts.family(),
            plaintext_modulus: opts.plaintext_modulus().unwrap_or(0),
            multiplicative_depth: opts.multiplicative_depth(),
            security_level: opts.security_level(),
            ring_dimension: opts.ring_dim(),
            batch_size: opts.batch_size(),
            scaling_mod_size: opts.scaling_mod_size(),
            first_mod_size,
            scaling_technique: opts.scaling_technique(),
            key_switch_technique: opts.key_switch_technique(),
        }
    }
}

impl From<BfvParams> for ParameterSet {
    fn from(p: BfvParams) -> Self {
        ParameterSet::Bfv(p)
    }
}

impl From<BgvParams> for ParameterSet {
    fn from(p: BgvParams) -> Self {
        ParameterSet::Bgv(p)
    }
}

impl From<CkksParams> for ParameterSet {
    fn from(p: CkksParams) -> Self {
        ParameterSet::Ckks(p)
    }
}

/// Frozen parameters of a constructed context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeParams {
    pub family: SchemeFamily,
    /// Zero for CKKS
    pub plaintext_modulus: u64,
    pub multiplicative_depth: u32,
    pub security_level: SecurityLevel,
    pub ring_dimension: u32,
    pub batch_size: u32,
    pub scaling_mod_size: u32,
    pub first_mod_size: u32,
    pub scaling_technique: ScalingTechnique,
    pub key_switch_technique: KeySwitchTechnique,
}

impl SchemeParams {
    /// Digest over the canonical field encoding
    pub fn context_id(&self) -> ContextId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"hebind-context-v1");
        hasher.update(&[self.family.code()]);
        hasher.update(&self.plaintext_modulus.to_le_bytes());
        hasher.update(&self.multiplicative_depth.to_le_bytes());
        hasher.update(&(self.security_level as u32).to_le_bytes());
        hasher.update(&self.ring_dimension.to_le_bytes());
        hasher.update(&self.batch_size.to_le_bytes());
        hasher.update(&self.scaling_mod_size.to_le_bytes());
        hasher.update(&self.first_mod_size.to_le_bytes());
        hasher.update(&(self.scaling_technique as u32).to_le_bytes());
        hasher.update(&(self.key_switch_technique as u32).to_le_bytes());
        ContextId::from_bytes(*hasher.finalize().as_bytes())
    }

    pub fn slots(&self) -> usize {
        self.batch_size as usize
    }

    /// One tower per level plus the base modulus. `None` when the depth
    /// leaves no room for the base tower.
    pub fn tower_count(&self) -> Option<u32> {
        self.multiplicative_depth.checked_add(1)
    }
}

impl fmt::Display for SchemeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ring_dim={} batch={} depth={} security={} scaling={}",
            self.family,
            self.ring_dimension,
            self.batch_size,
            self.multiplicative_depth,
            self.security_level,
            self.scaling_technique
        )?;
        if self.family != SchemeFamily::Ckks {
            write!(f, " t={}", self.plaintext_modulus)?;
        }
        Ok(())
    }
}
