//! Context facade.
//!
//! A [`CryptoContext`] moves through `Configured -> FeatureEnabled ->
//! KeyMaterialPresent`. Features only ever get added; cached evaluation keys
//! live until cleared. Every verb checks its required feature and cached keys
//! first and reports a [`PreconditionError`] before the engine is touched.

use crate::engine::HeEngine;
use crate::error::{CoreError, CoreResult, PreconditionError};
use crate::features::{Feature, FeatureSet};
use crate::ids::{ContextId, KeyTag};
use crate::keystore::{EvalKeyMap, KeyMaterialStore, KeyRole, merge_maps};
use crate::objects::{Ciphertext, Encoding, EvalKey, KeyPair, Plaintext, PublicKey, SecretKey};
use crate::params::{SchemeFamily, SchemeParams};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Configured,
    FeatureEnabled,
    KeyMaterialPresent,
}

/// Engine tables carried by a context snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precomputed(#[serde(with = "crate::payload")] pub Vec<u8>);

/// Serializable description of a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub engine: String,
    pub params: SchemeParams,
    pub features: FeatureSet,
    pub precomputed: Option<Precomputed>,
}

pub struct CryptoContext {
    id: ContextId,
    params: SchemeParams,
    features: AtomicU8,
    keys: RwLock<KeyMaterialStore>,
    engine: Arc<dyn HeEngine>,
}

impl CryptoContext {
    /// `params` must already be resolved by `engine`
    pub(crate) fn new(params: SchemeParams, features: FeatureSet, engine: Arc<dyn HeEngine>) -> Self {
        let id = params.context_id();
        debug!(context = %id, params = %params, engine = engine.name(), "created crypto context");
        Self {
            id,
            params,
            features: AtomicU8::new(features.bits()),
            keys: RwLock::new(KeyMaterialStore::new()),
            engine,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn params(&self) -> &SchemeParams {
        &self.params
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn engine(&self) -> &Arc<dyn HeEngine> {
        &self.engine
    }

    pub fn features(&self) -> FeatureSet {
        FeatureSet::from_bits_truncate(self.features.load(Ordering::Acquire))
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.features().contains(feature)
    }

    pub fn enable(&self, feature: Feature) {
        let previous = self.features.fetch_or(feature.bit(), Ordering::AcqRel);
        if previous & feature.bit() == 0 {
            debug!(context = %self.id, feature = %feature, "enabled feature");
        }
    }

    pub fn enable_all(&self, features: FeatureSet) {
        for feature in features.iter() {
            self.enable(feature);
        }
    }

    // A panic caught at the boundary while the store was locked leaves it
    // poisoned; the store itself is only ever mutated after validation.
    fn store(&self) -> RwLockReadGuard<'_, KeyMaterialStore> {
        self.keys.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_mut(&self) -> RwLockWriteGuard<'_, KeyMaterialStore> {
        self.keys.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ContextState {
        if !self.store().is_empty() {
            ContextState::KeyMaterialPresent
        } else if !self.features().is_empty() {
            ContextState::FeatureEnabled
        } else {
            ContextState::Configured
        }
    }

    pub fn batch_size(&self) -> u32 {
        self.params.batch_size
    }

    pub fn ring_dimension(&self) -> u32 {
        self.params.ring_dimension
    }

    /// Zero for CKKS
    pub fn plaintext_modulus(&self) -> u64 {
        self.params.plaintext_modulus
    }

    pub fn ciphertext_modulus(&self) -> BigUint {
        self.engine.ciphertext_modulus(&self.params)
    }

    pub fn snapshot(&self, include_precompute: bool) -> CoreResult<ContextSnapshot> {
        let precomputed = if include_precompute {
            Some(Precomputed(self.engine.precompute(&self.params)?))
        } else {
            None
        };
        Ok(ContextSnapshot {
            engine: self.engine.name().to_string(),
            params: self.params.clone(),
            features: self.features(),
            precomputed,
        })
    }

    fn require(&self, feature: Feature) -> CoreResult<()> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            Err(PreconditionError::FeatureNotEnabled(feature).into())
        }
    }

    fn check_context(&self, other: ContextId) -> CoreResult<()> {
        if other == self.id {
            Ok(())
        } else {
            Err(CoreError::ContextMismatch {
                expected: self.id,
                actual: other,
            })
        }
    }

    fn check_same_key(&self, a: &Ciphertext, b: &Ciphertext) -> CoreResult<()> {
        self.check_context(a.context())?;
        self.check_context(b.context())?;
        if a.key_tag() != b.key_tag() {
            return Err(CoreError::KeyMismatch {
                expected: a.key_tag().clone(),
                actual: b.key_tag().clone(),
            });
        }
        Ok(())
    }

    fn lookup(&self, role: KeyRole, tag: &KeyTag, index: u32) -> CoreResult<EvalKey> {
        self.store()
            .get(role, tag, index)
            .cloned()
            .ok_or_else(|| {
                PreconditionError::MissingEvalKey {
                    role,
                    key_tag: tag.clone(),
                    index,
                }
                .into()
            })
    }

    /// Rotation amounts are stored as left rotations in `0..batch`
    fn normalize_rotation(&self, index: i32) -> u32 {
        let n = i64::from(self.params.batch_size.max(1));
        i64::from(index).rem_euclid(n) as u32
    }

    fn sum_steps(&self, batch: u32) -> Vec<u32> {
        let mut steps = Vec::new();
        let mut step = 1u32;
        while step < batch {
            steps.push(step);
            step <<= 1;
        }
        steps
    }

    // --- keys and encoding ---

    pub fn key_gen(&self) -> CoreResult<KeyPair> {
        self.require(Feature::Pke)?;
        let kp = self.engine.key_gen(&self.params)?;
        debug!(context = %self.id, key_tag = %kp.public.key_tag(), "generated key pair");
        Ok(kp)
    }

    pub fn make_packed_plaintext(&self, values: &[i64]) -> CoreResult<Plaintext> {
        Ok(self.engine.encode_packed(&self.params, values)?)
    }

    pub fn make_ckks_packed_plaintext(&self, values: &[f64]) -> CoreResult<Plaintext> {
        Ok(self.engine.encode_ckks_packed(&self.params, values)?)
    }

    pub fn encrypt(&self, key: &PublicKey, plaintext: &Plaintext) -> CoreResult<Ciphertext> {
        self.require(Feature::Pke)?;
        self.check_context(key.context())?;
        Ok(self.engine.encrypt(&self.params, key, plaintext)?)
    }

    pub fn decrypt(&self, key: &SecretKey, ciphertext: &Ciphertext) -> CoreResult<Plaintext> {
        self.require(Feature::Pke)?;
        self.check_context(key.context())?;
        self.check_context(ciphertext.context())?;
        if key.key_tag() != ciphertext.key_tag() {
            return Err(CoreError::KeyMismatch {
                expected: ciphertext.key_tag().clone(),
                actual: key.key_tag().clone(),
            });
        }
        Ok(self.engine.decrypt(&self.params, key, ciphertext)?)
    }

    // --- leveled arithmetic ---

    pub fn eval_add(&self, a: &Ciphertext, b: &Ciphertext) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_same_key(a, b)?;
        Ok(self.engine.eval_add(&self.params, a, b)?)
    }

    pub fn eval_sub(&self, a: &Ciphertext, b: &Ciphertext) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_same_key(a, b)?;
        Ok(self.engine.eval_sub(&self.params, a, b)?)
    }

    pub fn eval_negate(&self, ciphertext: &Ciphertext) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_context(ciphertext.context())?;
        Ok(self.engine.eval_negate(&self.params, ciphertext)?)
    }

    pub fn eval_mult(&self, a: &Ciphertext, b: &Ciphertext) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_same_key(a, b)?;
        let relin = self.lookup(KeyRole::Mult, a.key_tag(), 0)?;
        Ok(self.engine.eval_mult(&self.params, &relin, a, b)?)
    }

    pub fn eval_mult_plain(&self, ciphertext: &Ciphertext, plaintext: &Plaintext) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_context(ciphertext.context())?;
        Ok(self.engine.eval_mult_plain(&self.params, ciphertext, plaintext)?)
    }

    pub fn eval_mult_const(&self, ciphertext: &Ciphertext, constant: f64) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_context(ciphertext.context())?;
        Ok(self.engine.eval_mult_const(&self.params, ciphertext, constant)?)
    }

    /// Product of all inputs, multiplied pairwise as a balanced tree
    pub fn eval_mult_many(&self, ciphertexts: &[Ciphertext]) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        if ciphertexts.is_empty() {
            return Err(CoreError::InvalidArgument("no ciphertexts to multiply".into()));
        }
        let mut layer = ciphertexts.to_vec();
        while layer.len() > 1 {
            let mut next = Vec::with_capacity(layer.len().div_ceil(2));
            let mut items = layer.into_iter();
            while let Some(a) = items.next() {
                match items.next() {
                    Some(b) => next.push(self.eval_mult(&a, &b)?),
                    None => next.push(a),
                }
            }
            layer = next;
        }
        layer
            .pop()
            .ok_or_else(|| CoreError::InvalidArgument("no ciphertexts to multiply".into()))
    }

    /// Rotate left by `index` slots (negative rotates right)
    pub fn eval_at_index(&self, ciphertext: &Ciphertext, index: i32) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_context(ciphertext.context())?;
        let normalized = self.normalize_rotation(index);
        if normalized == 0 {
            return Ok(ciphertext.clone());
        }
        let key = self.lookup(KeyRole::Rotation, ciphertext.key_tag(), normalized)?;
        Ok(self.engine.eval_rotate(&self.params, &key, ciphertext)?)
    }

    pub fn mod_reduce(&self, ciphertext: &Ciphertext) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_context(ciphertext.context())?;
        Ok(self.engine.mod_reduce(&self.params, ciphertext)?)
    }

    pub fn compress(&self, ciphertext: &Ciphertext, towers: u32) -> CoreResult<Ciphertext> {
        self.require(Feature::LeveledShe)?;
        self.check_context(ciphertext.context())?;
        Ok(self.engine.compress(&self.params, ciphertext, towers)?)
    }

    // --- advanced arithmetic ---

    fn check_batch(&self, batch: u32) -> CoreResult<()> {
        if batch == 0 || !batch.is_power_of_two() || batch > self.params.batch_size {
            return Err(CoreError::InvalidArgument(format!(
                "batch size {batch} must be a power of two no larger than {}",
                self.params.batch_size
            )));
        }
        Ok(())
    }

    /// Slot 0 of the result holds the sum of the first `batch` slots
    pub fn eval_sum(&self, ciphertext: &Ciphertext, batch: u32) -> CoreResult<Ciphertext> {
        self.require(Feature::AdvancedShe)?;
        self.check_context(ciphertext.context())?;
        self.check_batch(batch)?;
        let mut acc = ciphertext.clone();
        for step in self.sum_steps(batch) {
            let key = self.lookup(KeyRole::Sum, ciphertext.key_tag(), step)?;
            let rotated = self.engine.eval_rotate(&self.params, &key, &acc)?;
            acc = self.engine.eval_add(&self.params, &acc, &rotated)?;
        }
        Ok(acc)
    }

    pub fn eval_inner_product(&self, a: &Ciphertext, b: &Ciphertext, batch: u32) -> CoreResult<Ciphertext> {
        self.require(Feature::AdvancedShe)?;
        let product = self.eval_mult(a, b)?;
        self.eval_sum(&product, batch)
    }

    /// Packs slot 0 of each input into consecutive slots of one ciphertext.
    /// Needs rotation keys for `-1..-(n-1)`.
    pub fn eval_merge(&self, ciphertexts: &[Ciphertext]) -> CoreResult<Ciphertext> {
        self.require(Feature::AdvancedShe)?;
        let Some(first) = ciphertexts.first() else {
            return Err(CoreError::InvalidArgument("no ciphertexts to merge".into()));
        };
        let mask = match first.encoding() {
            Encoding::Packed => self.make_packed_plaintext(&[1])?,
            Encoding::CkksPacked => self.make_ckks_packed_plaintext(&[1.0])?,
        };
        let mut acc = self.eval_mult_plain(first, &mask)?;
        for (i, ct) in ciphertexts.iter().enumerate().skip(1) {
            self.check_same_key(first, ct)?;
            let masked = self.eval_mult_plain(ct, &mask)?;
            let shift = i32::try_from(i)
                .map_err(|_| CoreError::InvalidArgument("too many ciphertexts to merge".into()))?;
            let placed = self.eval_at_index(&masked, -shift)?;
            acc = self.engine.eval_add(&self.params, &acc, &placed)?;
        }
        Ok(acc)
    }

    pub fn eval_linear_wsum(&self, ciphertexts: &[Ciphertext], weights: &[f64]) -> CoreResult<Ciphertext> {
        self.require(Feature::AdvancedShe)?;
        if ciphertexts.is_empty() || ciphertexts.len() != weights.len() {
            return Err(CoreError::InvalidArgument(format!(
                "{} ciphertexts for {} weights",
                ciphertexts.len(),
                weights.len()
            )));
        }
        let mut acc: Option<Ciphertext> = None;
        for (ct, w) in ciphertexts.iter().zip(weights) {
            let term = self.eval_mult_const(ct, *w)?;
            acc = Some(match acc {
                None => term,
                Some(prev) => self.eval_add(&prev, &term)?,
            });
        }
        acc.ok_or_else(|| CoreError::InvalidArgument("no ciphertexts to sum".into()))
    }

    // --- evaluation key generation ---

    pub fn eval_mult_key_gen(&self, secret: &SecretKey) -> CoreResult<()> {
        self.require(Feature::LeveledShe)?;
        self.check_context(secret.context())?;
        let key = self.engine.eval_mult_key_gen(&self.params, secret)?;
        self.store_mut().insert(key);
        debug!(context = %self.id, key_tag = %secret.key_tag(), "generated relinearization key");
        Ok(())
    }

    pub fn eval_at_index_key_gen(&self, secret: &SecretKey, indices: &[i32]) -> CoreResult<()> {
        self.require(Feature::LeveledShe)?;
        self.check_context(secret.context())?;
        let mut generated = Vec::with_capacity(indices.len());
        for index in indices {
            let normalized = self.normalize_rotation(*index);
            if normalized == 0 {
                continue;
            }
            generated.push(self.engine.rotation_key_gen(
                &self.params,
                secret,
                KeyRole::Rotation,
                normalized,
                None,
            )?);
        }
        let mut store = self.store_mut();
        for key in generated {
            store.insert(key);
        }
        debug!(context = %self.id, key_tag = %secret.key_tag(), count = indices.len(), "generated rotation keys");
        Ok(())
    }

    pub fn eval_sum_key_gen(&self, secret: &SecretKey) -> CoreResult<()> {
        self.require(Feature::AdvancedShe)?;
        self.check_context(secret.context())?;
        let mut generated = Vec::new();
        for step in self.sum_steps(self.params.batch_size) {
            generated.push(self.engine.rotation_key_gen(&self.params, secret, KeyRole::Sum, step, None)?);
        }
        let mut store = self.store_mut();
        for key in generated {
            store.insert(key);
        }
        debug!(context = %self.id, key_tag = %secret.key_tag(), "generated summation keys");
        Ok(())
    }

    // --- proxy re-encryption ---

    pub fn re_key_gen(&self, secret: &SecretKey, target: &PublicKey) -> CoreResult<EvalKey> {
        self.require(Feature::Pre)?;
        self.check_context(secret.context())?;
        self.check_context(target.context())?;
        Ok(self.engine.re_key_gen(&self.params, secret, target)?)
    }

    pub fn re_encrypt(&self, key: &EvalKey, ciphertext: &Ciphertext) -> CoreResult<Ciphertext> {
        self.require(Feature::Pre)?;
        self.check_context(key.context())?;
        self.check_context(ciphertext.context())?;
        if key.role() != KeyRole::ReEncrypt {
            return Err(CoreError::InvalidArgument(format!(
                "{} key cannot re-encrypt",
                key.role()
            )));
        }
        Ok(self.engine.re_encrypt(&self.params, key, ciphertext)?)
    }

    // --- threshold ---

    pub fn multiparty_key_gen(&self, joint: &PublicKey) -> CoreResult<KeyPair> {
        self.require(Feature::Multiparty)?;
        self.check_context(joint.context())?;
        let kp = self.engine.multiparty_key_gen(&self.params, joint)?;
        debug!(context = %self.id, key_tag = %kp.public.key_tag(), "generated multiparty key pair");
        Ok(kp)
    }

    fn decrypt_shares(&self, secret: &SecretKey, ciphertexts: &[Ciphertext], lead: bool) -> CoreResult<Vec<Ciphertext>> {
        self.require(Feature::Multiparty)?;
        self.check_context(secret.context())?;
        ciphertexts
            .iter()
            .map(|ct| -> CoreResult<Ciphertext> {
                self.check_context(ct.context())?;
                Ok(self.engine.multiparty_decrypt_share(&self.params, secret, ct, lead)?)
            })
            .collect()
    }

    pub fn multiparty_decrypt_lead(&self, secret: &SecretKey, ciphertexts: &[Ciphertext]) -> CoreResult<Vec<Ciphertext>> {
        self.decrypt_shares(secret, ciphertexts, true)
    }

    pub fn multiparty_decrypt_main(&self, secret: &SecretKey, ciphertexts: &[Ciphertext]) -> CoreResult<Vec<Ciphertext>> {
        self.decrypt_shares(secret, ciphertexts, false)
    }

    pub fn multiparty_decrypt_fusion(&self, shares: &[Ciphertext]) -> CoreResult<Plaintext> {
        self.require(Feature::Multiparty)?;
        if shares.is_empty() {
            return Err(CoreError::InvalidArgument("no decryption shares to fuse".into()));
        }
        for share in shares {
            self.check_context(share.context())?;
        }
        Ok(self.engine.multiparty_decrypt_fusion(&self.params, shares)?)
    }

    /// This party's shares of the joint rotation keys in `base`
    pub fn multi_eval_at_index_key_gen(
        &self,
        secret: &SecretKey,
        base: &EvalKeyMap,
        indices: &[i32],
        joint_tag: &KeyTag,
    ) -> CoreResult<EvalKeyMap> {
        self.require(Feature::Multiparty)?;
        self.check_context(secret.context())?;
        let base_tag = base.key_tag().cloned().unwrap_or_else(|| joint_tag.clone());
        let mut out = EvalKeyMap::new();
        for index in indices {
            let normalized = self.normalize_rotation(*index);
            if normalized == 0 {
                continue;
            }
            let base_key = base.get(normalized).ok_or_else(|| PreconditionError::MissingEvalKey {
                role: KeyRole::Rotation,
                key_tag: base_tag.clone(),
                index: normalized,
            })?;
            let share = self.engine.rotation_key_gen(
                &self.params,
                secret,
                KeyRole::Rotation,
                normalized,
                Some(base_key),
            )?;
            out.insert(share.retagged(joint_tag));
        }
        Ok(out)
    }

    /// This party's shares of every summation key in `base`
    pub fn multi_eval_sum_key_gen(
        &self,
        secret: &SecretKey,
        base: &EvalKeyMap,
        joint_tag: &KeyTag,
    ) -> CoreResult<EvalKeyMap> {
        self.require(Feature::Multiparty)?;
        self.check_context(secret.context())?;
        let mut out = EvalKeyMap::new();
        for base_key in base.iter() {
            self.check_context(base_key.context())?;
            let share = self.engine.rotation_key_gen(
                &self.params,
                secret,
                KeyRole::Sum,
                base_key.index(),
                Some(base_key),
            )?;
            out.insert(share.retagged(joint_tag));
        }
        Ok(out)
    }

    /// Combine two parties' partial maps into one joint map
    pub fn multi_add_eval_keys(&self, a: &EvalKeyMap, b: &EvalKeyMap, joint_tag: &KeyTag) -> CoreResult<EvalKeyMap> {
        self.require(Feature::Multiparty)?;
        for key in a.iter().chain(b.iter()) {
            self.check_context(key.context())?;
        }
        merge_maps(a, b, joint_tag, |x, y| {
            Ok(self.engine.add_eval_keys(&self.params, x, y)?)
        })
    }

    // --- key-material store ---

    fn check_cacheable(&self, key: &EvalKey, role: KeyRole) -> CoreResult<()> {
        self.check_context(key.context())?;
        if key.role() != role {
            return Err(CoreError::InvalidArgument(format!(
                "expected a {role} key, found {}",
                key.role()
            )));
        }
        Ok(())
    }

    pub fn insert_eval_mult_keys(&self, keys: &[EvalKey]) -> CoreResult<()> {
        for key in keys {
            self.check_cacheable(key, KeyRole::Mult)?;
        }
        let mut store = self.store_mut();
        for key in keys {
            store.insert(key.clone());
        }
        Ok(())
    }

    fn insert_map(&self, role: KeyRole, map: &EvalKeyMap) -> CoreResult<()> {
        for key in map.iter() {
            self.check_cacheable(key, role)?;
        }
        self.store_mut().insert_map(map);
        Ok(())
    }

    pub fn insert_eval_automorphism_keys(&self, map: &EvalKeyMap) -> CoreResult<()> {
        self.insert_map(KeyRole::Rotation, map)
    }

    pub fn insert_eval_sum_keys(&self, map: &EvalKeyMap) -> CoreResult<()> {
        self.insert_map(KeyRole::Sum, map)
    }

    pub fn eval_mult_key(&self, tag: &KeyTag) -> Option<EvalKey> {
        self.store().get(KeyRole::Mult, tag, 0).cloned()
    }

    pub fn eval_automorphism_key_map(&self, tag: &KeyTag) -> Option<EvalKeyMap> {
        self.store().get_map(KeyRole::Rotation, tag).cloned()
    }

    pub fn eval_sum_key_map(&self, tag: &KeyTag) -> Option<EvalKeyMap> {
        self.store().get_map(KeyRole::Sum, tag).cloned()
    }

    pub fn has_key_material(&self, role: KeyRole, tag: &KeyTag) -> bool {
        self.store().get_map(role, tag).is_some_and(|map| !map.is_empty())
    }

    pub fn clear_eval_mult_keys(&self) {
        self.store_mut().clear(KeyRole::Mult);
    }

    pub fn clear_eval_automorphism_keys(&self) {
        self.store_mut().clear(KeyRole::Rotation);
    }

    pub fn clear_eval_sum_keys(&self) {
        self.store_mut().clear(KeyRole::Sum);
    }

    /// Merge a partial map into the cached joint map under `joint_tag`
    pub fn merge_eval_keys(&self, role: KeyRole, joint_tag: &KeyTag, other: &EvalKeyMap) -> CoreResult<()> {
        self.require(Feature::Multiparty)?;
        for key in other.iter() {
            self.check_cacheable(key, role)?;
        }
        let mut store = self.store_mut();
        store.merge(role, joint_tag, other, |x, y| {
            Ok(self.engine.add_eval_keys(&self.params, x, y)?)
        })
    }

    /// Every cached map of `role`, optionally restricted to one key tag
    pub fn key_material(&self, role: KeyRole, tag: Option<&KeyTag>) -> BTreeMap<KeyTag, EvalKeyMap> {
        self.store().snapshot(role, tag)
    }

    pub fn load_key_material(&self, role: KeyRole, maps: BTreeMap<KeyTag, EvalKeyMap>) -> CoreResult<()> {
        for map in maps.values() {
            for key in map.iter() {
                self.check_cacheable(key, role)?;
            }
        }
        self.store_mut().load(maps);
        Ok(())
    }
}

impl fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoContext")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("features", &self.features())
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl fmt::Display for CryptoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoContext[{}, features={}]", self.params, self.features())?;
        if self.params.family == SchemeFamily::Ckks {
            write!(f, " (approximate)")?;
        }
        Ok(())
    }
}
