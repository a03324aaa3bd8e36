//! Error types for the foreign call surface

use crate::handle::{Handle, ObjectKind};
use hebind_core::{ConfigError, CoreError, PreconditionError};
use hebind_proto::ProtoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Precondition violated: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Serialization failed: {0}")]
    Serialization(ProtoError),

    #[error("Engine failure: {0}")]
    Engine(String),

    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    #[error("Unknown handle {0}")]
    UnknownHandle(Handle),

    #[error("Handle {handle} is empty: {reason}")]
    EmptyHandle { handle: Handle, reason: String },

    #[error("Handle {handle} holds a {actual}, expected a {expected}")]
    KindMismatch {
        handle: Handle,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type BindResult<T> = Result<T, BindError>;

/// Coarse classification surfaced to foreign callers as an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorKind {
    Configuration = 1,
    Precondition = 2,
    Serialization = 3,
    Engine = 4,
    Cryptographic = 5,
    Handle = 6,
    InvalidArgument = 7,
}

impl BindError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindError::Config(_) => ErrorKind::Configuration,
            BindError::Precondition(_) => ErrorKind::Precondition,
            BindError::Serialization(_) => ErrorKind::Serialization,
            BindError::Engine(_) => ErrorKind::Engine,
            BindError::Crypto(_) => ErrorKind::Cryptographic,
            BindError::UnknownHandle(_)
            | BindError::EmptyHandle { .. }
            | BindError::KindMismatch { .. } => ErrorKind::Handle,
            BindError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn code(&self) -> u32 {
        self.kind() as u32
    }
}

impl From<CoreError> for BindError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Config(e) => BindError::Config(e),
            CoreError::Precondition(e) => BindError::Precondition(e),
            CoreError::Engine(e) => BindError::Engine(e.to_string()),
            CoreError::InvalidArgument(msg) => BindError::InvalidArgument(msg),
            other @ (CoreError::ContextMismatch { .. }
            | CoreError::KeyMismatch { .. }
            | CoreError::EngineMismatch { .. }) => BindError::Crypto(other.to_string()),
        }
    }
}

impl From<ProtoError> for BindError {
    fn from(e: ProtoError) -> Self {
        match e {
            ProtoError::Core(inner) => inner.into(),
            other => BindError::Serialization(other),
        }
    }
}
