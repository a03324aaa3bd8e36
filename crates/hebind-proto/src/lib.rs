//! hebind-proto: wire formats for hebind objects
//!
//! Provides:
//! - Runtime format selection ([`Format::Binary`] or [`Format::Text`]) per call
//! - A single generic [`Codec`] shared by every serializable kind
//! - Context interning on decode and bulk evaluation-key bundles
//! - Boolean contexts and their bootstrapping keys
//!
//! ## Format Selection
//!
//! | Format | Encoding     | Payload bytes |
//! |--------|--------------|---------------|
//! | Binary | bincode      | raw           |
//! | Text   | JSON         | base64        |

pub mod binfhe;
pub mod codec;
pub mod context;
pub mod error;
pub mod format;
pub mod impls;
pub mod wire;

pub use codec::{Codec, DEFAULT_MAX_LEN, deserialize, serialize};
pub use context::KeyMaterialBundle;
pub use error::{ProtoError, ProtoResult};
pub use format::Format;
pub use wire::Wire;
