//! Caller-selected wire format

use hebind_core::ConfigError;
use std::fmt;

/// Chosen per call; there is no default and no autodetection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Compact, `bincode`
    Binary,
    /// Human-readable, JSON
    Text,
}

impl Format {
    /// Foreign code: `Text = 0`, `Binary = 1`
    pub fn code(self) -> u32 {
        match self {
            Format::Text => 0,
            Format::Binary => 1,
        }
    }
}

impl TryFrom<u32> for Format {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Text),
            1 => Ok(Format::Binary),
            other => Err(ConfigError::UnknownFormat(other)),
        }
    }
}

impl std::str::FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binary" | "bin" => Ok(Format::Binary),
            "text" | "json" => Ok(Format::Text),
            other => Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("unknown format {other}"),
            }),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Binary => write!(f, "binary"),
            Format::Text => write!(f, "text"),
        }
    }
}
