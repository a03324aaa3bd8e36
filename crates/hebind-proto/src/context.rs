//! Context and bulk key-material serialization.
//!
//! Decoding a context goes through the [`ContextRegistry`], so a buffer that
//! describes an already live context yields that same context. Key-material
//! bundles embed the context snapshot: the receiving side re-creates (or finds)
//! the context first, then files the keys into its store.

use crate::codec::Codec;
use crate::error::{ProtoError, ProtoResult};
use crate::format::Format;
use crate::wire::Wire;
use hebind_core::{
    ContextRegistry, ContextSnapshot, CryptoContext, EvalKeyMap, HeEngine, KeyRole, KeyTag,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Every cached key of one role, plus the context they belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMaterialBundle {
    pub context: ContextSnapshot,
    pub role: KeyRole,
    pub maps: BTreeMap<KeyTag, EvalKeyMap>,
}

impl Codec {
    pub fn encode_context(
        &self,
        ctx: &CryptoContext,
        format: Format,
        include_precompute: bool,
    ) -> ProtoResult<Vec<u8>> {
        let snapshot = ctx.snapshot(include_precompute)?;
        self.encode(&snapshot, format)
    }

    pub fn decode_context(
        &self,
        bytes: &[u8],
        format: Format,
        registry: &ContextRegistry,
        engine: Arc<dyn HeEngine>,
    ) -> ProtoResult<Arc<CryptoContext>> {
        let snapshot: ContextSnapshot = self.decode(bytes, format)?;
        registry.restore(snapshot, engine).map_err(|e| {
            warn!(object = ContextSnapshot::OBJECT_NAME, %format, error = %e, "context restore failed");
            ProtoError::from(e)
        })
    }

    /// `key_tag` restricts the bundle to one tag; `None` takes every tag
    pub fn encode_key_material(
        &self,
        ctx: &CryptoContext,
        role: KeyRole,
        key_tag: Option<&KeyTag>,
        format: Format,
        include_precompute: bool,
    ) -> ProtoResult<Vec<u8>> {
        let bundle = KeyMaterialBundle {
            context: ctx.snapshot(include_precompute)?,
            role,
            maps: ctx.key_material(role, key_tag),
        };
        debug!(context = %ctx.id(), %role, tags = bundle.maps.len(), %format, "serializing key material");
        self.encode(&bundle, format)
    }

    /// Returns the context the keys were filed into. A bundle whose keys do
    /// not check out leaves the registry untouched.
    pub fn decode_key_material(
        &self,
        bytes: &[u8],
        format: Format,
        registry: &ContextRegistry,
        engine: Arc<dyn HeEngine>,
    ) -> ProtoResult<Arc<CryptoContext>> {
        let bundle: KeyMaterialBundle = self.decode(bytes, format)?;
        let role = bundle.role;
        registry
            .restore_with_keys(bundle.context, engine, role, bundle.maps)
            .map_err(|e| {
                warn!(object = KeyMaterialBundle::OBJECT_NAME, %format, %role, error = %e, "key material rejected");
                ProtoError::from(e)
            })
    }
}
