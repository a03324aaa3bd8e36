//! Parameter builders and context construction

use super::{Bindings, guarded};
use crate::error::BindResult;
use crate::handle::{Handle, ParamsCell};
use hebind_core::{
    ConfigError, Feature, KeySwitchTechnique, ParameterOptions, ParameterSet, ScalingTechnique, SchemeFamily,
    SecurityLevel,
};
use tracing::debug;

impl Bindings {
    /// New builder for `scheme` ("BFVRNS", "BGVRNS" or "CKKSRNS")
    pub fn new_params(&self, scheme: &str) -> BindResult<Handle> {
        let family: SchemeFamily = scheme.parse()?;
        Ok(self.handles.wrap(ParamsCell::new(ParameterSet::new(family))))
    }

    fn with_params<T>(
        &self,
        params: Handle,
        f: impl FnOnce(&mut dyn ParameterOptions) -> Result<T, ConfigError>,
    ) -> BindResult<T> {
        let cell = self.get::<ParamsCell>(params)?;
        let mut set = cell.write();
        Ok(f(set.options_mut())?)
    }

    /// Zero when the scheme has no plaintext modulus
    pub fn get_plaintext_modulus(&self, params: Handle) -> BindResult<u64> {
        self.with_params(params, |p| Ok(p.plaintext_modulus().unwrap_or(0)))
    }

    pub fn set_plaintext_modulus(&self, params: Handle, modulus: u64) -> BindResult<()> {
        self.with_params(params, |p| p.set_plaintext_modulus(modulus))
    }

    pub fn get_multiplicative_depth(&self, params: Handle) -> BindResult<u32> {
        self.with_params(params, |p| Ok(p.multiplicative_depth()))
    }

    pub fn set_multiplicative_depth(&self, params: Handle, depth: u32) -> BindResult<()> {
        self.with_params(params, |p| p.set_multiplicative_depth(depth))
    }

    pub fn set_security_level(&self, params: Handle, code: u32) -> BindResult<()> {
        let level = SecurityLevel::try_from(code)?;
        self.with_params(params, |p| {
            p.set_security_level(level);
            Ok(())
        })
    }

    pub fn set_ring_dim(&self, params: Handle, ring_dim: u32) -> BindResult<()> {
        self.with_params(params, |p| p.set_ring_dim(ring_dim))
    }

    pub fn set_scaling_mod_size(&self, params: Handle, bits: u32) -> BindResult<()> {
        self.with_params(params, |p| p.set_scaling_mod_size(bits))
    }

    pub fn set_batch_size(&self, params: Handle, batch_size: u32) -> BindResult<()> {
        self.with_params(params, |p| p.set_batch_size(batch_size))
    }

    pub fn set_scaling_technique(&self, params: Handle, code: u32) -> BindResult<()> {
        let technique = ScalingTechnique::try_from(code)?;
        self.with_params(params, |p| p.set_scaling_technique(technique))
    }

    pub fn set_key_switch_technique(&self, params: Handle, code: u32) -> BindResult<()> {
        let technique = KeySwitchTechnique::try_from(code)?;
        self.with_params(params, |p| {
            p.set_key_switch_technique(technique);
            Ok(())
        })
    }

    /// CKKS only
    pub fn set_first_mod_size(&self, params: Handle, bits: u32) -> BindResult<()> {
        let cell = self.get::<ParamsCell>(params)?;
        let mut set = cell.write();
        Ok(set.set_first_mod_size(bits)?)
    }

    /// Builds (or finds) the context for the builder's current values. Later
    /// changes to the builder do not reach the context.
    pub fn gen_crypto_context(&self, params: Handle) -> BindResult<Handle> {
        let cell = self.get::<ParamsCell>(params)?;
        let snapshot = cell.read().clone();
        let ctx = guarded("GenCryptoContext", || {
            Ok(self.contexts.gen_context(&snapshot, self.engine.clone())?)
        })?;
        debug!(context = %ctx.id(), params = %ctx.params(), "context handle issued");
        Ok(self.handles.wrap_arc(ctx))
    }

    pub fn enable(&self, context: Handle, feature_code: u32) -> BindResult<()> {
        let feature = Feature::try_from(feature_code)?;
        self.context(context)?.enable(feature);
        Ok(())
    }

    pub fn is_enabled(&self, context: Handle, feature_code: u32) -> BindResult<bool> {
        let feature = Feature::try_from(feature_code)?;
        Ok(self.context(context)?.is_enabled(feature))
    }
}
