//! Runtime dispatch between the binary and text encodings

use crate::error::{ProtoError, ProtoResult};
use crate::format::Format;
use crate::wire::{Envelope, EnvelopeRef, Wire};
use bincode::Options;
use tracing::warn;

pub const DEFAULT_MAX_LEN: u64 = 256 * 1024 * 1024;

/// Encoder/decoder with a decode size limit
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    max_len: u64,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

impl Codec {
    pub fn new(max_len: u64) -> Self {
        Self { max_len }
    }

    pub fn max_len(&self) -> u64 {
        self.max_len
    }

    fn binary(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_limit(self.max_len)
            .reject_trailing_bytes()
    }

    /// All or nothing: on error no bytes are returned
    pub fn encode<T: Wire>(&self, value: &T, format: Format) -> ProtoResult<Vec<u8>> {
        let envelope = EnvelopeRef {
            object: T::OBJECT_NAME,
            version: T::VERSION,
            body: value,
        };
        let bytes = match format {
            Format::Binary => self.binary().serialize(&envelope)?,
            Format::Text => serde_json::to_vec(&envelope)?,
        };
        Ok(bytes)
    }

    /// Never yields a partially built object. Failures are logged.
    pub fn decode<T: Wire>(&self, bytes: &[u8], format: Format) -> ProtoResult<T> {
        let result = self.decode_envelope(bytes, format);
        if let Err(e) = &result {
            warn!(object = T::OBJECT_NAME, %format, len = bytes.len(), error = %e, "deserialization failed");
        }
        result
    }

    fn decode_envelope<T: Wire>(&self, bytes: &[u8], format: Format) -> ProtoResult<T> {
        let len = bytes.len() as u64;
        if len > self.max_len {
            return Err(ProtoError::TooLarge {
                len,
                limit: self.max_len,
            });
        }
        let envelope: Envelope<T> = match format {
            Format::Binary => self.binary().deserialize(bytes)?,
            Format::Text => serde_json::from_slice(bytes)?,
        };
        if envelope.object != T::OBJECT_NAME {
            return Err(ProtoError::UnexpectedObject {
                expected: T::OBJECT_NAME,
                found: envelope.object,
            });
        }
        if envelope.version > T::VERSION {
            return Err(ProtoError::UnsupportedVersion {
                object: T::OBJECT_NAME,
                found: envelope.version,
                supported: T::VERSION,
            });
        }
        Ok(envelope.body)
    }
}

pub fn serialize<T: Wire>(value: &T, format: Format) -> ProtoResult<Vec<u8>> {
    Codec::default().encode(value, format)
}

pub fn deserialize<T: Wire>(bytes: &[u8], format: Format) -> ProtoResult<T> {
    Codec::default().decode(bytes, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<i64>,
    }

    impl Wire for Sample {
        const OBJECT_NAME: &'static str = "Sample";
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Other {
        name: String,
        values: Vec<i64>,
    }

    impl Wire for Other {
        const OBJECT_NAME: &'static str = "Other";
    }

    fn sample() -> Sample {
        Sample {
            name: "p".into(),
            values: vec![1, -2, 3],
        }
    }

    #[test]
    fn test_round_trip_both_formats() {
        for format in [Format::Binary, Format::Text] {
            let bytes = serialize(&sample(), format).unwrap();
            assert_eq!(deserialize::<Sample>(&bytes, format).unwrap(), sample());
        }
    }

    #[test]
    fn test_text_is_json_envelope() {
        let bytes = serialize(&sample(), Format::Text).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["object"], "Sample");
        assert_eq!(value["version"], 1);
    }

    #[test]
    fn test_wrong_object_kind_rejected() {
        let bytes = serialize(&sample(), Format::Binary).unwrap();
        assert!(matches!(
            deserialize::<Other>(&bytes, Format::Binary),
            Err(ProtoError::UnexpectedObject { expected: "Other", .. })
        ));
    }

    #[test]
    fn test_format_mismatch_detected() {
        let text = serialize(&sample(), Format::Text).unwrap();
        assert!(deserialize::<Sample>(&text, Format::Binary).is_err());
        let binary = serialize(&sample(), Format::Binary).unwrap();
        assert!(deserialize::<Sample>(&binary, Format::Text).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = serialize(&sample(), Format::Binary).unwrap();
        bytes.push(0);
        assert!(deserialize::<Sample>(&bytes, Format::Binary).is_err());
    }

    #[test]
    fn test_size_limit() {
        let codec = Codec::new(8);
        let bytes = serialize(&sample(), Format::Text).unwrap();
        assert!(matches!(
            codec.decode::<Sample>(&bytes, Format::Text),
            Err(ProtoError::TooLarge { limit: 8, .. })
        ));
    }

    #[test]
    fn test_newer_version_rejected() {
        let bytes = br#"{"object":"Sample","version":9,"body":{"name":"p","values":[]}}"#;
        assert!(matches!(
            deserialize::<Sample>(bytes, Format::Text),
            Err(ProtoError::UnsupportedVersion { found: 9, .. })
        ));
    }
}
