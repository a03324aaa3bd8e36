//! Boolean-circuit contexts: bits, bootstrapping keys and binary gates

use super::{Bindings, guarded};
use crate::error::{BindError, BindResult};
use crate::handle::Handle;
use hebind_core::{
    BinFheContext, BinFheMethod, BinFheParamSet, BinFheParams, BinGate, LweCiphertext, LwePrivateKey,
    PreconditionError, RefreshKey, SwitchingKey,
};

impl Bindings {
    /// Context from a predefined parameter set code and a method code
    pub fn binfhe_context_gen(&self, param_set: u32, method: u32) -> BindResult<Handle> {
        let set = BinFheParamSet::try_from(param_set)?;
        let method = BinFheMethod::try_from(method)?;
        let ctx = guarded("GenerateBinFHEContext", || {
            Ok(BinFheContext::generate(set, method, self.boolean_engine.clone())?)
        })?;
        Ok(self.handles.wrap(ctx))
    }

    /// Context from explicit LWE and RingGSW parameters
    #[allow(clippy::too_many_arguments)]
    pub fn binfhe_context_gen_custom(
        &self,
        lattice_dim: u32,
        ring_dim: u32,
        modulus: u64,
        ring_modulus: u64,
        key_switch_modulus: u64,
        std_dev: f64,
        base_ks: u32,
        base_g: u32,
        base_r: u32,
        method: u32,
    ) -> BindResult<Handle> {
        let params = BinFheParams {
            lattice_dim,
            ring_dim,
            modulus,
            ring_modulus,
            key_switch_modulus,
            std_dev,
            base_ks,
            base_g,
            base_r,
            method: BinFheMethod::try_from(method)?,
        };
        let ctx = guarded("GenerateBinFHEContext", || {
            Ok(BinFheContext::with_params(params, self.boolean_engine.clone())?)
        })?;
        Ok(self.handles.wrap(ctx))
    }

    pub fn binfhe_method(&self, context: Handle) -> BindResult<u32> {
        Ok(self.binfhe_context(context)?.method() as u32)
    }

    pub fn binfhe_lattice_dim(&self, context: Handle) -> BindResult<u32> {
        Ok(self.binfhe_context(context)?.params().lattice_dim)
    }

    // --- keys ---

    pub fn binfhe_key_gen(&self, context: Handle) -> BindResult<Handle> {
        let ctx = self.binfhe_context(context)?;
        let key = guarded("KeyGen", || Ok(ctx.key_gen()?))?;
        Ok(self.handles.wrap(key))
    }

    /// Ring secret of dimension `N`, input to [`Bindings::binfhe_key_switch_gen`]
    pub fn binfhe_key_gen_n(&self, context: Handle) -> BindResult<Handle> {
        let ctx = self.binfhe_context(context)?;
        let key = guarded("KeyGenN", || Ok(ctx.key_gen_n()?))?;
        Ok(self.handles.wrap(key))
    }

    pub fn binfhe_key_switch_gen(&self, context: Handle, secret: Handle, ring_secret: Handle) -> BindResult<Handle> {
        let ctx = self.binfhe_context(context)?;
        let secret = self.get::<LwePrivateKey>(secret)?;
        let ring_secret = self.get::<LwePrivateKey>(ring_secret)?;
        let key = guarded("KeySwitchGen", || Ok(ctx.key_switch_gen(&secret, &ring_secret)?))?;
        Ok(self.handles.wrap(key))
    }

    pub fn binfhe_bt_key_gen(&self, context: Handle, secret: Handle) -> BindResult<()> {
        let ctx = self.binfhe_context(context)?;
        let secret = self.get::<LwePrivateKey>(secret)?;
        guarded("BTKeyGen", || Ok(ctx.bt_key_gen(&secret)?))
    }

    pub fn binfhe_bt_key_load(&self, context: Handle, refresh: Handle, switching: Handle) -> BindResult<()> {
        let ctx = self.binfhe_context(context)?;
        let refresh = self.get::<RefreshKey>(refresh)?;
        let switching = self.get::<SwitchingKey>(switching)?;
        guarded("BTKeyLoad", || {
            Ok(ctx.bt_key_load((*refresh).clone(), (*switching).clone())?)
        })
    }

    pub fn binfhe_clear_bt_keys(&self, context: Handle) -> BindResult<()> {
        self.binfhe_context(context)?.clear_bt_keys();
        Ok(())
    }

    pub fn binfhe_refresh_key(&self, context: Handle) -> BindResult<Handle> {
        let key = self
            .binfhe_context(context)?
            .refresh_key()
            .ok_or(PreconditionError::NoBootstrapKeys)?;
        Ok(self.handles.wrap(key))
    }

    pub fn binfhe_switch_key(&self, context: Handle) -> BindResult<Handle> {
        let key = self
            .binfhe_context(context)?
            .switch_key()
            .ok_or(PreconditionError::NoBootstrapKeys)?;
        Ok(self.handles.wrap(key))
    }

    // --- bits ---

    pub fn binfhe_encrypt(&self, context: Handle, secret: Handle, message: u32) -> BindResult<Handle> {
        let ctx = self.binfhe_context(context)?;
        let secret = self.get::<LwePrivateKey>(secret)?;
        let ct = guarded("Encrypt", || Ok(ctx.encrypt(&secret, u64::from(message))?))?;
        Ok(self.handles.wrap(ct))
    }

    pub fn binfhe_decrypt(&self, context: Handle, secret: Handle, ciphertext: Handle) -> BindResult<u32> {
        let ctx = self.binfhe_context(context)?;
        let secret = self.get::<LwePrivateKey>(secret)?;
        let ct = self.get::<LweCiphertext>(ciphertext)?;
        let message = guarded("Decrypt", || Ok(ctx.decrypt(&secret, &ct)?))?;
        u32::try_from(message).map_err(|_| BindError::Engine(format!("Decrypt: message {message} out of range")))
    }

    /// `gate` is a gate code (OR = 0, AND = 1, ... XNOR = 7)
    pub fn binfhe_eval_bin_gate(&self, context: Handle, gate: u32, a: Handle, b: Handle) -> BindResult<Handle> {
        let gate = BinGate::try_from(gate)?;
        let ctx = self.binfhe_context(context)?;
        let a = self.get::<LweCiphertext>(a)?;
        let b = self.get::<LweCiphertext>(b)?;
        let out = guarded("EvalBinGate", || Ok(ctx.eval_bin_gate(gate, &a, &b)?))?;
        Ok(self.handles.wrap(out))
    }

    pub fn binfhe_eval_not(&self, context: Handle, ciphertext: Handle) -> BindResult<Handle> {
        let ctx = self.binfhe_context(context)?;
        let ct = self.get::<LweCiphertext>(ciphertext)?;
        let out = guarded("EvalNOT", || Ok(ctx.eval_not(&ct)?))?;
        Ok(self.handles.wrap(out))
    }

    pub fn binfhe_bootstrap(&self, context: Handle, ciphertext: Handle) -> BindResult<Handle> {
        let ctx = self.binfhe_context(context)?;
        let ct = self.get::<LweCiphertext>(ciphertext)?;
        let out = guarded("Bootstrap", || Ok(ctx.bootstrap(&ct)?))?;
        Ok(self.handles.wrap(out))
    }
}
