//! Cryptographic objects exchanged with the engine.
//!
//! Every object carries the [`ContextId`] of the context that produced it.
//! That binding is for validation only: objects never own their context.

use crate::error::{CoreError, CoreResult};
use crate::ids::{ContextId, KeyTag};
use crate::keystore::KeyRole;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Public half of a key pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    context: ContextId,
    key_tag: KeyTag,
    #[serde(with = "crate::payload")]
    payload: Vec<u8>,
}

impl PublicKey {
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

    pub fn key_tag(&self) -> &KeyTag {
        &self.key_tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey(tag={}, context={}, {} bytes)",
            self.key_tag,
            self.context,
            self.payload.len()
        )
    }
}

/// Secret half of a key pair (zeroized on drop)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    context: ContextId,
    #[zeroize(skip)]
    key_tag: KeyTag,
    #[serde(with = "crate::payload")]
    payload: Vec<u8>,
}

impl SecretKey {
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

    pub fn key_tag(&self) -> &KeyTag {
        &self.key_tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("context", &self.context)
            .field("key_tag", &self.key_tag)
            .field("payload", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(tag={}, context={})", self.key_tag, self.context)
    }
}

/// Public + secret
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub secret: SecretKey,
}

impl KeyPair {
    /// Both halves present and generated together
    pub fn is_good(&self) -> bool {
        !self.public.payload.is_empty()
            && !self.secret.payload.is_empty()
            && self.public.key_tag == self.secret.key_tag
            && self.public.context == self.secret.context
    }
}

/// Switching key for one index of one role
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalKey {
    context: ContextId,
    key_tag: KeyTag,
    role: KeyRole,
    index: u32,
    #[serde(with = "crate::payload")]
    payload: Vec<u8>,
}

impl EvalKey {
    pub fn new(
        context: ContextId,
        key_tag: KeyTag,
        role: KeyRole,
        index: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            context,
            key_tag,
            role,
            index,
            payload,
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn key_tag(&self) -> &KeyTag {
        &self.key_tag
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Same key material filed under another key tag (joint keys)
    pub fn retagged(mut self, key_tag: &KeyTag) -> Self {
        self.key_tag = key_tag.clone();
        self
    }
}

impl fmt::Display for EvalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EvalKey({} index={} tag={})",
            self.role, self.index, self.key_tag
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    Packed,
    CkksPacked,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Packed => write!(f, "PACKED_ENCODING"),
            Encoding::CkksPacked => write!(f, "CKKS_PACKED_ENCODING"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaintextValues {
    Integer(Vec<i64>),
    Real(Vec<f64>),
}

impl PlaintextValues {
    pub fn len(&self) -> usize {
        match self {
            PlaintextValues::Integer(v) => v.len(),
            PlaintextValues::Real(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded slot values plus the logical length exposed to callers
#[derive(Debug, Clone, PartialEq)]
pub struct Plaintext {
    encoding: Encoding,
    values: PlaintextValues,
    length: usize,
}

impl Plaintext {
    pub fn new(encoding: Encoding, values: PlaintextValues) -> Self {
        let length = values.len();
        Self {
            encoding,
            values,
            length,
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn values(&self) -> &PlaintextValues {
        &self.values
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Clamped to the number of decoded slots
    pub fn set_length(&mut self, length: usize) {
        self.length = length.min(self.values.len());
    }

    pub fn packed_value(&self) -> CoreResult<&[i64]> {
        match &self.values {
            PlaintextValues::Integer(v) => Ok(&v[..self.length]),
            PlaintextValues::Real(_) => Err(CoreError::InvalidArgument(
                "packed integer values requested from a CKKS plaintext".into(),
            )),
        }
    }

    pub fn real_packed_value(&self) -> Vec<f64> {
        match &self.values {
            PlaintextValues::Integer(v) => v[..self.length].iter().map(|x| *x as f64).collect(),
            PlaintextValues::Real(v) => v[..self.length].to_vec(),
        }
    }
}

impl fmt::Display for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<String> = match &self.values {
            PlaintextValues::Integer(v) => v[..self.length].iter().map(|x| x.to_string()).collect(),
            PlaintextValues::Real(v) => v[..self.length].iter().map(|x| format!("{x:.6}")).collect(),
        };
        write!(f, "({}, ... )", shown.join(", "))
    }
}

/// Encrypted value: opaque engine payload plus the metadata the boundary checks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    context: ContextId,
    key_tag: KeyTag,
    encoding: Encoding,
    /// Rescalings / modulus reductions applied
    level: u32,
    /// Multiplicative depth consumed
    depth: u32,
    slots: u32,
    #[serde(with = "crate::payload")]
    payload: Vec<u8>,
}

impl Ciphertext {
    pub fn new(
        context: ContextId,
        key_tag: KeyTag,
        encoding: Encoding,
        slots: u32,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            context,
            key_tag,
            encoding,
            level: 0,
            depth: 0,
            slots,
            payload,
        }
    }

    /// New payload, same metadata
    pub fn derive(&self, payload: Vec<u8>) -> Self {
        Self {
            payload,
            key_tag: self.key_tag.clone(),
            ..*self
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn retagged(mut self, key_tag: &KeyTag) -> Self {
        self.key_tag = key_tag.clone();
        self
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn key_tag(&self) -> &KeyTag {
        &self.key_tag
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn slots(&self) -> u32 {
        self.slots
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ciphertext(encoding={}, level={}, depth={}, slots={}, tag={})",
            self.encoding, self.level, self.depth, self.slots, self.key_tag
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ContextId {
        ContextId::from_bytes([1u8; 32])
    }

    #[test]
    fn test_plaintext_set_length_clamps() {
        let mut pt = Plaintext::new(Encoding::Packed, PlaintextValues::Integer(vec![2, 4, 6, 0, 0]));
        pt.set_length(3);
        assert_eq!(pt.packed_value().unwrap(), &[2, 4, 6]);
        pt.set_length(100);
        assert_eq!(pt.length(), 5);
        assert_eq!(pt.to_string(), "(2, 4, 6, 0, 0, ... )");
    }

    #[test]
    fn test_real_plaintext_rejects_packed_value() {
        let pt = Plaintext::new(Encoding::CkksPacked, PlaintextValues::Real(vec![0.5, 1.5]));
        assert!(pt.packed_value().is_err());
        assert_eq!(pt.real_packed_value(), vec![0.5, 1.5]);
    }

    #[test]
    fn test_key_pair_is_good() {
        let tag = KeyTag::random();
        let kp = KeyPair {
            public: PublicKey::new(ctx(), tag.clone(), vec![1, 2]),
            secret: SecretKey::new(ctx(), tag, vec![3]),
        };
        assert!(kp.is_good());

        let bad = KeyPair {
            public: PublicKey::new(ctx(), KeyTag::random(), vec![1]),
            secret: SecretKey::new(ctx(), KeyTag::random(), vec![3]),
        };
        assert!(!bad.is_good());
    }

    #[test]
    fn test_secret_key_debug_redacts() {
        let sk = SecretKey::new(ctx(), KeyTag::new("t"), vec![42; 8]);
        let shown = format!("{sk:?}");
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("42"));
    }

    #[test]
    fn test_ciphertext_derive_keeps_metadata() {
        let ct = Ciphertext::new(ctx(), KeyTag::new("t"), Encoding::Packed, 8, vec![1])
            .with_level(1)
            .with_depth(2);
        let next = ct.derive(vec![9, 9]);
        assert_eq!(next.level(), 1);
        assert_eq!(next.depth(), 2);
        assert_eq!(next.key_tag(), ct.key_tag());
        assert_eq!(next.payload(), &[9, 9]);
    }

    #[test]
    fn test_payload_text_form_is_base64() {
        let pk = PublicKey::new(ctx(), KeyTag::new("t"), vec![0xde, 0xad]);
        let json = serde_json::to_value(&pk).unwrap();
        assert_eq!(json["payload"], "3q0=");
        let back: PublicKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, pk);
    }
}
