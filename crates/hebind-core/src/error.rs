use crate::engine::EngineError;
use crate::features::Feature;
use crate::ids::{ContextId, KeyTag};
use crate::keystore::KeyRole;
use crate::params::SchemeFamily;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Object belongs to context {actual}, expected {expected}")]
    ContextMismatch {
        expected: ContextId,
        actual: ContextId,
    },

    #[error("Key tag mismatch: expected {expected}, found {actual}")]
    KeyMismatch { expected: KeyTag, actual: KeyTag },

    #[error("Context was produced by engine {actual}, expected {expected}")]
    EngineMismatch { expected: String, actual: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Bad configuration input, rejected before any context state changes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown security level code: {0}")]
    UnknownSecurityLevel(u32),

    #[error("Unknown scaling technique code: {0}")]
    UnknownScalingTechnique(u32),

    #[error("Unknown key switching technique code: {0}")]
    UnknownKeySwitchTechnique(u32),

    #[error("Unknown scheme feature code: {0}")]
    UnknownFeature(u32),

    #[error("Unknown serialization format code: {0}")]
    UnknownFormat(u32),

    #[error("Unknown boolean parameter set code: {0}")]
    UnknownBinFheParamSet(u32),

    #[error("Unknown bootstrapping method code: {0}")]
    UnknownBinFheMethod(u32),

    #[error("Unknown binary gate code: {0}")]
    UnknownBinGate(u32),

    #[error("Unknown scheme family: {0}")]
    UnknownScheme(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("{field} is not supported by the {scheme} scheme")]
    Unsupported {
        field: &'static str,
        scheme: SchemeFamily,
    },
}

/// Operation invoked in the wrong context state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("Feature {0} is not enabled on this context")]
    FeatureNotEnabled(Feature),

    #[error("No {role} key at index {index} for key tag {key_tag}")]
    MissingEvalKey {
        role: KeyRole,
        key_tag: KeyTag,
        index: u32,
    },

    #[error("No {role} keys are cached for key tag {key_tag}")]
    NoKeyMaterial { role: KeyRole, key_tag: KeyTag },

    #[error("Bootstrapping keys have not been generated or loaded")]
    NoBootstrapKeys,
}
