//! Envelope shared by every serialized object.
//!
//! The object name and version are the only self-description a buffer
//! carries; the format itself is supplied by the caller.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A kind that crosses the wire
pub trait Wire: Serialize + DeserializeOwned {
    const OBJECT_NAME: &'static str;
    const VERSION: u32 = 1;
}

#[derive(Serialize)]
pub(crate) struct EnvelopeRef<'a, T> {
    pub object: &'a str,
    pub version: u32,
    pub body: &'a T,
}

#[derive(Deserialize)]
pub(crate) struct Envelope<T> {
    pub object: String,
    pub version: u32,
    pub body: T,
}
