//! Evaluation keys, proxy re-encryption and threshold operations

use super::{Bindings, KeyPairHandles, guarded};
use crate::error::BindResult;
use crate::handle::Handle;
use hebind_core::{Ciphertext, EvalKey, EvalKeyMap, KeyTag, PublicKey, SecretKey};
use tracing::debug;

impl Bindings {
    pub fn eval_mult_key_gen(&self, context: Handle, secret: Handle) -> BindResult<()> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        guarded("EvalMultKeyGen", || Ok(ctx.eval_mult_key_gen(&secret)?))
    }

    /// Negative indices rotate right
    pub fn eval_at_index_key_gen(&self, context: Handle, secret: Handle, indices: &[i32]) -> BindResult<()> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        guarded("EvalAtIndexKeyGen", || Ok(ctx.eval_at_index_key_gen(&secret, indices)?))
    }

    pub fn eval_sum_key_gen(&self, context: Handle, secret: Handle) -> BindResult<()> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        guarded("EvalSumKeyGen", || Ok(ctx.eval_sum_key_gen(&secret)?))
    }

    // --- proxy re-encryption ---

    pub fn re_key_gen(&self, context: Handle, secret: Handle, target: Handle) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        let target = self.get::<PublicKey>(target)?;
        let key = guarded("ReKeyGen", || Ok(ctx.re_key_gen(&secret, &target)?))?;
        Ok(self.handles.wrap(key))
    }

    pub fn re_encrypt(&self, context: Handle, key: Handle, ciphertext: Handle) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let key = self.get::<EvalKey>(key)?;
        let ct = self.get::<Ciphertext>(ciphertext)?;
        let out = guarded("ReEncrypt", || Ok(ctx.re_encrypt(&key, &ct)?))?;
        Ok(self.handles.wrap(out))
    }

    // --- threshold ---

    pub fn multiparty_key_gen(&self, context: Handle, joint: Handle) -> BindResult<KeyPairHandles> {
        let ctx = self.context(context)?;
        let joint = self.get::<PublicKey>(joint)?;
        let pair = guarded("MultipartyKeyGen", || Ok(ctx.multiparty_key_gen(&joint)?))?;
        Ok(self.wrap_key_pair(pair))
    }

    pub fn multiparty_decrypt_lead(
        &self,
        context: Handle,
        secret: Handle,
        ciphertexts: &[Handle],
    ) -> BindResult<Vec<Handle>> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        let cts = self.ciphertexts(ciphertexts)?;
        let shares = guarded("MultipartyDecryptLead", || {
            Ok(ctx.multiparty_decrypt_lead(&secret, &cts)?)
        })?;
        Ok(self.wrap_ciphertexts(shares))
    }

    pub fn multiparty_decrypt_main(
        &self,
        context: Handle,
        secret: Handle,
        ciphertexts: &[Handle],
    ) -> BindResult<Vec<Handle>> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        let cts = self.ciphertexts(ciphertexts)?;
        let shares = guarded("MultipartyDecryptMain", || {
            Ok(ctx.multiparty_decrypt_main(&secret, &cts)?)
        })?;
        Ok(self.wrap_ciphertexts(shares))
    }

    pub fn multiparty_decrypt_fusion(&self, context: Handle, shares: &[Handle]) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let shares = self.ciphertexts(shares)?;
        let plaintext = guarded("MultipartyDecryptFusion", || {
            Ok(ctx.multiparty_decrypt_fusion(&shares)?)
        })?;
        Ok(self.wrap_plaintext(plaintext))
    }

    pub fn multi_eval_at_index_key_gen(
        &self,
        context: Handle,
        secret: Handle,
        base: Handle,
        indices: &[i32],
        joint_tag: &str,
    ) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        let base = self.get::<EvalKeyMap>(base)?;
        let tag = KeyTag::new(joint_tag);
        let share = guarded("MultiEvalAtIndexKeyGen", || {
            Ok(ctx.multi_eval_at_index_key_gen(&secret, &base, indices, &tag)?)
        })?;
        Ok(self.handles.wrap(share))
    }

    pub fn multi_eval_sum_key_gen(
        &self,
        context: Handle,
        secret: Handle,
        base: Handle,
        joint_tag: &str,
    ) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let secret = self.get::<SecretKey>(secret)?;
        let base = self.get::<EvalKeyMap>(base)?;
        let tag = KeyTag::new(joint_tag);
        let share = guarded("MultiEvalSumKeyGen", || {
            Ok(ctx.multi_eval_sum_key_gen(&secret, &base, &tag)?)
        })?;
        Ok(self.handles.wrap(share))
    }

    /// Combines two partial key maps under `joint_tag`
    pub fn multi_add_eval_keys(&self, context: Handle, a: Handle, b: Handle, joint_tag: &str) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let a = self.get::<EvalKeyMap>(a)?;
        let b = self.get::<EvalKeyMap>(b)?;
        let tag = KeyTag::new(joint_tag);
        let merged = guarded("MultiAddEvalKeys", || Ok(ctx.multi_add_eval_keys(&a, &b, &tag)?))?;
        debug!(tag = %tag, indices = merged.len(), "eval key shares combined");
        Ok(self.handles.wrap(merged))
    }

    // --- key-material store ---

    pub fn insert_eval_mult_keys(&self, context: Handle, keys: &[Handle]) -> BindResult<()> {
        let ctx = self.context(context)?;
        let keys = keys
            .iter()
            .map(|h| self.get::<EvalKey>(*h).map(|k| (*k).clone()))
            .collect::<BindResult<Vec<_>>>()?;
        Ok(ctx.insert_eval_mult_keys(&keys)?)
    }

    pub fn insert_eval_automorphism_keys(&self, context: Handle, map: Handle) -> BindResult<()> {
        let ctx = self.context(context)?;
        let map = self.get::<EvalKeyMap>(map)?;
        Ok(ctx.insert_eval_automorphism_keys(&map)?)
    }

    pub fn insert_eval_sum_keys(&self, context: Handle, map: Handle) -> BindResult<()> {
        let ctx = self.context(context)?;
        let map = self.get::<EvalKeyMap>(map)?;
        Ok(ctx.insert_eval_sum_keys(&map)?)
    }

    /// `None` when no relinearization key is cached under `tag`
    pub fn eval_mult_key(&self, context: Handle, tag: &str) -> BindResult<Option<Handle>> {
        let ctx = self.context(context)?;
        Ok(ctx
            .eval_mult_key(&KeyTag::new(tag))
            .map(|key| self.handles.wrap(key)))
    }

    pub fn eval_automorphism_key_map(&self, context: Handle, tag: &str) -> BindResult<Option<Handle>> {
        let ctx = self.context(context)?;
        Ok(ctx
            .eval_automorphism_key_map(&KeyTag::new(tag))
            .map(|map| self.handles.wrap(map)))
    }

    pub fn eval_sum_key_map(&self, context: Handle, tag: &str) -> BindResult<Option<Handle>> {
        let ctx = self.context(context)?;
        Ok(ctx
            .eval_sum_key_map(&KeyTag::new(tag))
            .map(|map| self.handles.wrap(map)))
    }

    pub fn clear_eval_mult_keys(&self, context: Handle) -> BindResult<()> {
        self.context(context)?.clear_eval_mult_keys();
        Ok(())
    }

    pub fn clear_eval_automorphism_keys(&self, context: Handle) -> BindResult<()> {
        self.context(context)?.clear_eval_automorphism_keys();
        Ok(())
    }

    pub fn clear_eval_sum_keys(&self, context: Handle) -> BindResult<()> {
        self.context(context)?.clear_eval_sum_keys();
        Ok(())
    }
}
