use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("Binary codec error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("Text codec error: {0}")]
    Text(#[from] serde_json::Error),

    #[error("Expected a serialized {expected}, found {found}")]
    UnexpectedObject {
        expected: &'static str,
        found: String,
    },

    #[error("Unsupported {object} serialization version {found} (newest known: {supported})")]
    UnsupportedVersion {
        object: &'static str,
        found: u32,
        supported: u32,
    },

    #[error("Buffer of {len} bytes exceeds the {limit} byte limit")]
    TooLarge { len: u64, limit: u64 },

    #[error("Core error: {0}")]
    Core(#[from] hebind_core::CoreError),
}

pub type ProtoResult<T> = Result<T, ProtoError>;
