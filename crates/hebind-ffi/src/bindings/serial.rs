//! Serialization with a caller-selected format code
//!
//! Object deserializers hand back a handle either way: a live one, or an empty
//! sentinel whose diagnostic says why decoding failed. Only an unknown format
//! code is reported as an error.

use super::{Bindings, guarded};
use crate::error::BindResult;
use crate::handle::{Handle, Wrappable};
use hebind_core::{
    BinFheContext, Ciphertext, CryptoContext, EvalKey, EvalKeyMap, KeyRole, KeyTag, LweCiphertext, LwePrivateKey,
    PreconditionError, PublicKey, RefreshKey, SecretKey, SwitchingKey,
};
use hebind_proto::{Format, Wire};

impl Bindings {
    fn serialize_object<T: Wrappable + Wire>(&self, handle: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        let format = Format::try_from(format_code)?;
        let object = self.get::<T>(handle)?;
        Ok(self.codec.encode(&*object, format)?)
    }

    fn deserialize_object<T: Wrappable + Wire>(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        let format = Format::try_from(format_code)?;
        match self.codec.decode::<T>(bytes, format) {
            Ok(object) => Ok(self.handles.wrap(object)),
            Err(e) => Ok(self.handles.wrap_empty::<T>(e.to_string())),
        }
    }

    // --- contexts ---

    /// Includes precomputed tables when [`Bindings::serialize_precompute`] is set
    pub fn serialize_context(&self, context: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        let format = Format::try_from(format_code)?;
        let ctx = self.context(context)?;
        Ok(self
            .codec
            .encode_context(&ctx, format, self.serialize_precompute())?)
    }

    /// Returns the already registered context when one has the same identity
    pub fn deserialize_context(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        let format = Format::try_from(format_code)?;
        let decoded = guarded("DeserializeCryptoContext", || {
            Ok(self
                .codec
                .decode_context(bytes, format, &self.contexts, self.engine.clone())?)
        });
        match decoded {
            Ok(ctx) => Ok(self.handles.wrap_arc(ctx)),
            Err(e) => Ok(self.handles.wrap_empty::<CryptoContext>(e.to_string())),
        }
    }

    // --- keys and ciphertexts ---

    pub fn serialize_public_key(&self, key: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<PublicKey>(key, format_code)
    }

    pub fn deserialize_public_key(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<PublicKey>(bytes, format_code)
    }

    pub fn serialize_secret_key(&self, key: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<SecretKey>(key, format_code)
    }

    pub fn deserialize_secret_key(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<SecretKey>(bytes, format_code)
    }

    pub fn serialize_ciphertext(&self, ciphertext: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<Ciphertext>(ciphertext, format_code)
    }

    pub fn deserialize_ciphertext(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<Ciphertext>(bytes, format_code)
    }

    pub fn serialize_eval_key(&self, key: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<EvalKey>(key, format_code)
    }

    pub fn deserialize_eval_key(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<EvalKey>(bytes, format_code)
    }

    pub fn serialize_eval_key_map(&self, map: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<EvalKeyMap>(map, format_code)
    }

    pub fn deserialize_eval_key_map(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<EvalKeyMap>(bytes, format_code)
    }

    // --- bulk key material ---

    fn serialize_role(
        &self,
        context: Handle,
        role: KeyRole,
        tag: Option<&str>,
        format_code: u32,
    ) -> BindResult<Vec<u8>> {
        let format = Format::try_from(format_code)?;
        let ctx = self.context(context)?;
        let tag = tag.map(KeyTag::new);
        Ok(self.codec.encode_key_material(
            &ctx,
            role,
            tag.as_ref(),
            format,
            self.serialize_precompute(),
        )?)
    }

    /// Files the keys into their context (re-created if needed) and returns
    /// a handle to it
    fn deserialize_role(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        let format = Format::try_from(format_code)?;
        let ctx = guarded("DeserializeEvalKeys", || {
            Ok(self
                .codec
                .decode_key_material(bytes, format, &self.contexts, self.engine.clone())?)
        })?;
        Ok(self.handles.wrap_arc(ctx))
    }

    /// Finds the context through the registry, so it works after the caller
    /// has released every handle to it
    fn serialize_role_for_tag(&self, role: KeyRole, tag: &str, format_code: u32) -> BindResult<Vec<u8>> {
        let format = Format::try_from(format_code)?;
        let tag = KeyTag::new(tag);
        let ctx = self
            .contexts
            .holding_keys(role, &tag)
            .ok_or_else(|| PreconditionError::NoKeyMaterial {
                role,
                key_tag: tag.clone(),
            })?;
        Ok(self.codec.encode_key_material(
            &ctx,
            role,
            Some(&tag),
            format,
            self.serialize_precompute(),
        )?)
    }

    pub fn serialize_eval_mult_keys_for_tag(&self, tag: &str, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_role_for_tag(KeyRole::Mult, tag, format_code)
    }

    pub fn serialize_eval_automorphism_keys_for_tag(&self, tag: &str, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_role_for_tag(KeyRole::Rotation, tag, format_code)
    }

    pub fn serialize_eval_sum_keys_for_tag(&self, tag: &str, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_role_for_tag(KeyRole::Sum, tag, format_code)
    }

    /// `tag` of `None` writes the keys of every tag
    pub fn serialize_eval_mult_keys(&self, context: Handle, tag: Option<&str>, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_role(context, KeyRole::Mult, tag, format_code)
    }

    pub fn deserialize_eval_mult_keys(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_role(bytes, format_code)
    }

    pub fn serialize_eval_automorphism_keys(
        &self,
        context: Handle,
        tag: Option<&str>,
        format_code: u32,
    ) -> BindResult<Vec<u8>> {
        self.serialize_role(context, KeyRole::Rotation, tag, format_code)
    }

    pub fn deserialize_eval_automorphism_keys(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_role(bytes, format_code)
    }

    pub fn serialize_eval_sum_keys(&self, context: Handle, tag: Option<&str>, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_role(context, KeyRole::Sum, tag, format_code)
    }

    pub fn deserialize_eval_sum_keys(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_role(bytes, format_code)
    }

    // --- boolean contexts ---

    /// Parameters only; bootstrapping keys are serialized separately
    pub fn serialize_binfhe_context(&self, context: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        let format = Format::try_from(format_code)?;
        let ctx = self.binfhe_context(context)?;
        Ok(self.codec.encode_binfhe_context(&ctx, format)?)
    }

    /// A new context without bootstrapping keys
    pub fn deserialize_binfhe_context(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        let format = Format::try_from(format_code)?;
        let decoded = guarded("DeserializeBinFHEContext", || {
            Ok(self
                .codec
                .decode_binfhe_context(bytes, format, self.boolean_engine.clone())?)
        });
        match decoded {
            Ok(ctx) => Ok(self.handles.wrap(ctx)),
            Err(e) => Ok(self.handles.wrap_empty::<BinFheContext>(e.to_string())),
        }
    }

    pub fn serialize_lwe_private_key(&self, key: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<LwePrivateKey>(key, format_code)
    }

    pub fn deserialize_lwe_private_key(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<LwePrivateKey>(bytes, format_code)
    }

    pub fn serialize_lwe_ciphertext(&self, ciphertext: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<LweCiphertext>(ciphertext, format_code)
    }

    pub fn deserialize_lwe_ciphertext(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<LweCiphertext>(bytes, format_code)
    }

    pub fn serialize_refresh_key(&self, key: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<RefreshKey>(key, format_code)
    }

    pub fn deserialize_refresh_key(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<RefreshKey>(bytes, format_code)
    }

    pub fn serialize_switching_key(&self, key: Handle, format_code: u32) -> BindResult<Vec<u8>> {
        self.serialize_object::<SwitchingKey>(key, format_code)
    }

    pub fn deserialize_switching_key(&self, bytes: &[u8], format_code: u32) -> BindResult<Handle> {
        self.deserialize_object::<SwitchingKey>(bytes, format_code)
    }
}
