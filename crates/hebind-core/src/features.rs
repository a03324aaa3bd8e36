use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optional scheme capabilities a context must enable before use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Feature {
    Pke = 0x01,
    KeySwitch = 0x02,
    Pre = 0x04,
    LeveledShe = 0x08,
    AdvancedShe = 0x10,
    Multiparty = 0x20,
    Fhe = 0x40,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::Pke,
        Feature::KeySwitch,
        Feature::Pre,
        Feature::LeveledShe,
        Feature::AdvancedShe,
        Feature::Multiparty,
        Feature::Fhe,
    ];

    pub fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::Pke => "PKE",
            Feature::KeySwitch => "KEYSWITCH",
            Feature::Pre => "PRE",
            Feature::LeveledShe => "LEVELEDSHE",
            Feature::AdvancedShe => "ADVANCEDSHE",
            Feature::Multiparty => "MULTIPARTY",
            Feature::Fhe => "FHE",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Feature {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "feature",
                reason: format!("unknown feature name {s}"),
            })
    }
}

impl TryFrom<u32> for Feature {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Feature::ALL
            .into_iter()
            .find(|f| u32::from(f.bit()) == value)
            .ok_or(ConfigError::UnknownFeature(value))
    }
}

/// Bit set of enabled features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct FeatureSet(u8);

impl FeatureSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Unknown bits are dropped.
    pub fn from_bits_truncate(bits: u8) -> Self {
        let known = Feature::ALL.iter().fold(0u8, |acc, f| acc | f.bit());
        Self(bits & known)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn insert(&mut self, feature: Feature) {
        self.0 |= feature.bit();
    }

    pub fn union(self, other: FeatureSet) -> FeatureSet {
        Self(self.0 | other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl From<u8> for FeatureSet {
    fn from(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl From<FeatureSet> for u8 {
    fn from(set: FeatureSet) -> Self {
        set.0
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut set = FeatureSet::empty();
        for f in iter {
            set.insert(f);
        }
        set
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<String> = self.iter().map(|feat| feat.to_string()).collect();
        f.write_str(&names.join("|"))
    }
}
