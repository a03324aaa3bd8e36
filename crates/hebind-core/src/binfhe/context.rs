use super::{
    BinFheMethod, BinFheParamSet, BinFheParams, BinGate, BooleanEngine, LweCiphertext, LwePrivateKey,
    RefreshKey, SwitchingKey,
};
use crate::error::{CoreError, CoreResult, PreconditionError};
use crate::ids::{ContextId, KeyTag};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

/// Refresh and switching key produced by one BTKeyGen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapKeys {
    pub refresh: RefreshKey,
    pub switching: SwitchingKey,
}

/// Key-independent serialized form of a boolean context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinFheSnapshot {
    pub engine: String,
    pub params: BinFheParams,
}

pub struct BinFheContext {
    id: ContextId,
    params: BinFheParams,
    bootstrap: RwLock<Option<BootstrapKeys>>,
    engine: Arc<dyn BooleanEngine>,
}

impl BinFheContext {
    /// Context over a predefined parameter set
    pub fn generate(set: BinFheParamSet, method: BinFheMethod, engine: Arc<dyn BooleanEngine>) -> CoreResult<Self> {
        let params = engine.preset(set, method)?;
        debug!(%set, %method, "resolved boolean parameter set");
        Self::with_params(params, engine)
    }

    /// Context over caller-chosen LWE/RingGSW parameters
    pub fn with_params(params: BinFheParams, engine: Arc<dyn BooleanEngine>) -> CoreResult<Self> {
        params.validate()?;
        engine.check_params(&params)?;
        let id = params.context_id();
        debug!(context = %id, params = %params, engine = engine.name(), "created boolean context");
        Ok(Self {
            id,
            params,
            bootstrap: RwLock::new(None),
            engine,
        })
    }

    /// Bootstrapping keys are not part of the snapshot; load them with
    /// [`BinFheContext::bt_key_load`].
    pub fn restore(snapshot: BinFheSnapshot, engine: Arc<dyn BooleanEngine>) -> CoreResult<Self> {
        if snapshot.engine != engine.name() {
            return Err(CoreError::EngineMismatch {
                expected: engine.name().to_string(),
                actual: snapshot.engine,
            });
        }
        Self::with_params(snapshot.params, engine)
    }

    pub fn snapshot(&self) -> BinFheSnapshot {
        BinFheSnapshot {
            engine: self.engine.name().to_string(),
            params: self.params.clone(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn params(&self) -> &BinFheParams {
        &self.params
    }

    pub fn method(&self) -> BinFheMethod {
        self.params.method
    }

    fn keys(&self) -> RwLockReadGuard<'_, Option<BootstrapKeys>> {
        self.bootstrap.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn keys_mut(&self) -> RwLockWriteGuard<'_, Option<BootstrapKeys>> {
        self.bootstrap.write().unwrap_or_else(PoisonError::into_inner)
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

    fn check_tag(expected: &KeyTag, actual: &KeyTag) -> CoreResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(CoreError::KeyMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            })
        }
    }

    /// Bootstrapping keys, checked against the ciphertexts about to use them
    fn bootstrap_keys_for(&self, inputs: &[&LweCiphertext]) -> CoreResult<BootstrapKeys> {
        let keys = self
            .keys()
            .clone()
            .ok_or(PreconditionError::NoBootstrapKeys)?;
        for ct in inputs {
            self.check_context(ct.context())?;
            Self::check_tag(keys.refresh.key_tag(), ct.key_tag())?;
        }
        Ok(keys)
    }

    // --- keys ---

    /// LWE secret of dimension `n`
    pub fn key_gen(&self) -> CoreResult<LwePrivateKey> {
        let key = self.engine.key_gen(&self.params, self.id, self.params.lattice_dim)?;
        debug!(context = %self.id, key_tag = %key.key_tag(), "generated LWE secret key");
        Ok(key)
    }

    /// Ring secret of dimension `N`
    pub fn key_gen_n(&self) -> CoreResult<LwePrivateKey> {
        Ok(self.engine.key_gen(&self.params, self.id, self.params.ring_dim)?)
    }

    pub fn key_switch_gen(&self, secret: &LwePrivateKey, ring_secret: &LwePrivateKey) -> CoreResult<SwitchingKey> {
        self.check_context(secret.context())?;
        self.check_context(ring_secret.context())?;
        Ok(self.engine.key_switch_gen(&self.params, secret, ring_secret)?)
    }

    /// Generates and installs the bootstrapping keys for `secret`
    pub fn bt_key_gen(&self, secret: &LwePrivateKey) -> CoreResult<()> {
        self.check_context(secret.context())?;
        let ring_secret = self.key_gen_n()?;
        let keys = BootstrapKeys {
            refresh: self.engine.refresh_key_gen(&self.params, secret, &ring_secret)?,
            switching: self.engine.key_switch_gen(&self.params, secret, &ring_secret)?,
        };
        debug!(context = %self.id, key_tag = %secret.key_tag(), "generated bootstrapping keys");
        *self.keys_mut() = Some(keys);
        Ok(())
    }

    /// Installs previously serialized bootstrapping keys. Both must belong to
    /// this context and to the same BTKeyGen; on failure the keys already
    /// installed stay in place.
    pub fn bt_key_load(&self, refresh: RefreshKey, switching: SwitchingKey) -> CoreResult<()> {
        self.check_context(refresh.context())?;
        self.check_context(switching.context())?;
        Self::check_tag(refresh.key_tag(), switching.key_tag())?;
        let keys = BootstrapKeys { refresh, switching };
        if let Err(e) = self.engine.check_bootstrap_keys(&self.params, &keys) {
            warn!(context = %self.id, error = %e, "bootstrapping keys rejected");
            return Err(e.into());
        }
        *self.keys_mut() = Some(keys);
        Ok(())
    }

    pub fn clear_bt_keys(&self) {
        *self.keys_mut() = None;
    }

    pub fn has_bootstrap_keys(&self) -> bool {
        self.keys().is_some()
    }

    pub fn refresh_key(&self) -> Option<RefreshKey> {
        self.keys().as_ref().map(|k| k.refresh.clone())
    }

    pub fn switch_key(&self) -> Option<SwitchingKey> {
        self.keys().as_ref().map(|k| k.switching.clone())
    }

    // --- bits ---

    /// Messages outside Z_4 are rejected
    pub fn encrypt(&self, secret: &LwePrivateKey, message: u64) -> CoreResult<LweCiphertext> {
        self.check_context(secret.context())?;
        Ok(self.engine.encrypt(&self.params, secret, message)?)
    }

    pub fn decrypt(&self, secret: &LwePrivateKey, ciphertext: &LweCiphertext) -> CoreResult<u64> {
        self.check_context(secret.context())?;
        self.check_context(ciphertext.context())?;
        Self::check_tag(secret.key_tag(), ciphertext.key_tag())?;
        Ok(self.engine.decrypt(&self.params, secret, ciphertext)?)
    }

    pub fn eval_bin_gate(&self, gate: BinGate, a: &LweCiphertext, b: &LweCiphertext) -> CoreResult<LweCiphertext> {
        let keys = self.bootstrap_keys_for(&[a, b])?;
        Ok(self.engine.eval_bin_gate(&self.params, &keys, gate, a, b)?)
    }

    pub fn eval_not(&self, ciphertext: &LweCiphertext) -> CoreResult<LweCiphertext> {
        self.check_context(ciphertext.context())?;
        Ok(self.engine.eval_not(&self.params, ciphertext)?)
    }

    pub fn bootstrap(&self, ciphertext: &LweCiphertext) -> CoreResult<LweCiphertext> {
        let keys = self.bootstrap_keys_for(&[ciphertext])?;
        Ok(self.engine.bootstrap(&self.params, &keys, ciphertext)?)
    }
}

impl fmt::Display for BinFheContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BinFHEContext(id={}, {}, bootstrapping keys {})",
            self.id,
            self.params,
            if self.has_bootstrap_keys() { "loaded" } else { "absent" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binfhe::MockBooleanEngine;
    use crate::engine::EngineError;

    fn toy() -> BinFheContext {
        BinFheContext::generate(BinFheParamSet::Toy, BinFheMethod::Ginx, Arc::new(MockBooleanEngine)).unwrap()
    }

    #[test]
    fn test_gate_requires_bootstrap_keys() {
        let cc = toy();
        let sk = cc.key_gen().unwrap();
        let ct = cc.encrypt(&sk, 1).unwrap();
        assert!(matches!(
            cc.eval_bin_gate(BinGate::And, &ct, &ct),
            Err(CoreError::Precondition(PreconditionError::NoBootstrapKeys))
        ));
        assert!(matches!(
            cc.bootstrap(&ct),
            Err(CoreError::Precondition(PreconditionError::NoBootstrapKeys))
        ));
        // NOT needs no keys
        let not = cc.eval_not(&ct).unwrap();
        assert_eq!(cc.decrypt(&sk, &not).unwrap(), 0);
    }

    #[test]
    fn test_bootstrap_refreshes_bit() {
        let cc = toy();
        let sk = cc.key_gen().unwrap();
        cc.bt_key_gen(&sk).unwrap();
        for m in [0, 1] {
            let ct = cc.encrypt(&sk, m).unwrap();
            let fresh = cc.bootstrap(&ct).unwrap();
            assert_ne!(fresh.payload(), ct.payload());
            assert_eq!(cc.decrypt(&sk, &fresh).unwrap(), m);
        }
    }

    #[test]
    fn test_gate_rejects_foreign_key_tag() {
        let cc = toy();
        let sk = cc.key_gen().unwrap();
        let other = cc.key_gen().unwrap();
        cc.bt_key_gen(&sk).unwrap();
        let mine = cc.encrypt(&sk, 1).unwrap();
        let theirs = cc.encrypt(&other, 1).unwrap();
        assert!(matches!(
            cc.eval_bin_gate(BinGate::Or, &mine, &theirs),
            Err(CoreError::KeyMismatch { .. })
        ));
        assert!(matches!(cc.decrypt(&sk, &theirs), Err(CoreError::KeyMismatch { .. })));
    }

    #[test]
    fn test_ciphertext_from_other_context_rejected() {
        let toy = toy();
        let medium =
            BinFheContext::generate(BinFheParamSet::Medium, BinFheMethod::Ginx, Arc::new(MockBooleanEngine))
                .unwrap();
        let sk = medium.key_gen().unwrap();
        let ct = medium.encrypt(&sk, 1).unwrap();
        assert!(matches!(toy.eval_not(&ct), Err(CoreError::ContextMismatch { .. })));
        assert!(matches!(toy.encrypt(&sk, 1), Err(CoreError::ContextMismatch { .. })));
    }

    #[test]
    fn test_mismatched_key_load_keeps_installed_keys() {
        let cc = toy();
        let sk = cc.key_gen().unwrap();
        cc.bt_key_gen(&sk).unwrap();
        let refresh = cc.refresh_key().unwrap();
        cc.bt_key_gen(&sk).unwrap();
        let switching = cc.switch_key().unwrap();

        let err = cc.bt_key_load(refresh, switching.clone()).unwrap_err();
        assert!(matches!(err, CoreError::Engine(EngineError::IncompatibleKeyShares)));
        assert_eq!(cc.switch_key(), Some(switching));

        let ct = cc.encrypt(&sk, 1).unwrap();
        let out = cc.eval_bin_gate(BinGate::And, &ct, &ct).unwrap();
        assert_eq!(cc.decrypt(&sk, &out).unwrap(), 1);
    }

    #[test]
    fn test_clear_bt_keys() {
        let cc = toy();
        let sk = cc.key_gen().unwrap();
        cc.bt_key_gen(&sk).unwrap();
        assert!(cc.has_bootstrap_keys());
        assert!(cc.to_string().contains("loaded"));
        cc.clear_bt_keys();
        assert!(cc.refresh_key().is_none());
        assert!(cc.switch_key().is_none());
    }

    #[test]
    fn test_custom_params_validated() {
        let mut params = MockBooleanEngine.preset(BinFheParamSet::Toy, BinFheMethod::Ap).unwrap();
        params.ring_dim = 100;
        assert!(matches!(
            BinFheContext::with_params(params, Arc::new(MockBooleanEngine)),
            Err(CoreError::Config(_))
        ));

        let mut params = MockBooleanEngine.preset(BinFheParamSet::Toy, BinFheMethod::Ap).unwrap();
        params.modulus = 1 << 40;
        params.ring_modulus = 1 << 50;
        assert!(matches!(
            BinFheContext::with_params(params, Arc::new(MockBooleanEngine)),
            Err(CoreError::Engine(EngineError::InvalidParameters(_)))
        ));
    }

    #[test]
    fn test_restore_checks_engine_name() {
        let cc = toy();
        let mut snapshot = cc.snapshot();
        let same = BinFheContext::restore(snapshot.clone(), Arc::new(MockBooleanEngine)).unwrap();
        assert_eq!(same.id(), cc.id());
        assert!(!same.has_bootstrap_keys());

        snapshot.engine = "openfhe".into();
        assert!(matches!(
            BinFheContext::restore(snapshot, Arc::new(MockBooleanEngine)),
            Err(CoreError::EngineMismatch { .. })
        ));
    }
}
