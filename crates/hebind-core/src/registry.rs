//! Interning table for live contexts.
//!
//! Holds a counted reference to every context it hands out, so a context
//! outlives all foreign handles to it until [`ContextRegistry::release_all_contexts`].

use crate::context::{ContextSnapshot, CryptoContext};
use crate::engine::HeEngine;
use crate::error::{CoreError, CoreResult};
use crate::features::FeatureSet;
use crate::ids::{ContextId, KeyTag};
use crate::keystore::{EvalKeyMap, KeyRole};
use crate::objects::EvalKey;
use crate::params::{ParameterSet, SchemeParams};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

#[derive(Default)]
pub struct ContextRegistry {
    contexts: RwLock<HashMap<ContextId, Arc<CryptoContext>>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build (or find) the context for a parameter set. The builder is copied;
    /// mutating it afterwards has no effect on the returned context.
    pub fn gen_context(
        &self,
        params: &ParameterSet,
        engine: Arc<dyn HeEngine>,
    ) -> CoreResult<Arc<CryptoContext>> {
        let resolved = engine.resolve(params.to_scheme_params())?;
        Ok(self.intern(resolved.context_id(), || {
            CryptoContext::new(resolved, Default::default(), engine)
        }))
    }

    /// Re-create a context from its snapshot. An already registered context
    /// with the same identity is returned instead, with the snapshot's
    /// features added to it.
    pub fn restore(
        &self,
        snapshot: ContextSnapshot,
        engine: Arc<dyn HeEngine>,
    ) -> CoreResult<Arc<CryptoContext>> {
        let resolved = Self::check_snapshot(&snapshot, engine.as_ref())?;
        Ok(self.register(resolved, snapshot.features, engine))
    }

    /// Restore a context and file `maps` into its store. Nothing is
    /// registered, and no features are added, unless both the snapshot and
    /// every key check out.
    pub fn restore_with_keys(
        &self,
        snapshot: ContextSnapshot,
        engine: Arc<dyn HeEngine>,
        role: KeyRole,
        maps: BTreeMap<KeyTag, EvalKeyMap>,
    ) -> CoreResult<Arc<CryptoContext>> {
        let resolved = Self::check_snapshot(&snapshot, engine.as_ref())?;
        let id = resolved.context_id();
        for (tag, map) in &maps {
            for key in map.iter() {
                check_bundled_key(id, role, tag, key)?;
                engine.check_eval_key(&resolved, key)?;
            }
        }
        let ctx = self.register(resolved, snapshot.features, engine);
        ctx.load_key_material(role, maps)?;
        Ok(ctx)
    }

    /// Engine, parameter and table checks shared by every restore path
    fn check_snapshot(snapshot: &ContextSnapshot, engine: &dyn HeEngine) -> CoreResult<SchemeParams> {
        if snapshot.engine != engine.name() {
            return Err(CoreError::EngineMismatch {
                expected: engine.name().to_string(),
                actual: snapshot.engine.clone(),
            });
        }
        let resolved = engine.resolve(snapshot.params.clone())?;
        if resolved != snapshot.params {
            return Err(CoreError::InvalidArgument(
                "serialized context parameters are not in resolved form".into(),
            ));
        }
        if let Some(tables) = &snapshot.precomputed {
            engine.check_precomputed(&resolved, &tables.0)?;
        }
        Ok(resolved)
    }

    fn register(
        &self,
        resolved: SchemeParams,
        features: FeatureSet,
        engine: Arc<dyn HeEngine>,
    ) -> Arc<CryptoContext> {
        let ctx = self.intern(resolved.context_id(), || {
            CryptoContext::new(resolved, features, engine)
        });
        ctx.enable_all(features);
        ctx
    }

    fn intern<F>(&self, id: ContextId, build: F) -> Arc<CryptoContext>
    where
        F: FnOnce() -> CryptoContext,
    {
        let mut contexts = self.contexts.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = contexts.get(&id) {
            debug!(context = %id, "reusing registered context");
            return existing.clone();
        }
        let ctx = Arc::new(build());
        contexts.insert(id, ctx.clone());
        ctx
    }

    pub fn get(&self, id: &ContextId) -> Option<Arc<CryptoContext>> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner).get(id).cloned()
    }

    /// The registered context caching `role` keys under `tag`, if any
    pub fn holding_keys(&self, role: KeyRole, tag: &KeyTag) -> Option<Arc<CryptoContext>> {
        self.contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|ctx| ctx.has_key_material(role, tag))
            .cloned()
    }

    pub fn ids(&self) -> Vec<ContextId> {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner).keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the registry's references. Contexts still held elsewhere stay alive.
    pub fn release_all_contexts(&self) -> usize {
        let mut contexts = self.contexts.write().unwrap_or_else(PoisonError::into_inner);
        let count = contexts.len();
        contexts.clear();
        info!(count, "released all contexts");
        count
    }
}

fn check_bundled_key(context: ContextId, role: KeyRole, tag: &KeyTag, key: &EvalKey) -> CoreResult<()> {
    if key.context() != context {
        return Err(CoreError::ContextMismatch {
            expected: context,
            actual: key.context(),
        });
    }
    if key.role() != role {
        return Err(CoreError::InvalidArgument(format!(
            "expected a {role} key, found {}",
            key.role()
        )));
    }
    if key.key_tag() != tag {
        return Err(CoreError::KeyMismatch {
            expected: tag.clone(),
            actual: key.key_tag().clone(),
        });
    }
    Ok(())
}
