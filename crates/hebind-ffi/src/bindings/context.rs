//! Context getters, plaintexts and homomorphic evaluation

use super::{Bindings, KeyPairHandles, guarded};
use crate::error::BindResult;
use crate::handle::{Handle, PlaintextCell};
use crate::marshal::{BigInteger, narrow_i64, narrow_u64, widen_i32};
use hebind_core::{Ciphertext, CoreResult, CryptoContext, PublicKey, SecretKey};

impl Bindings {
    pub fn batch_size(&self, context: Handle) -> BindResult<u32> {
        Ok(self.context(context)?.batch_size())
    }

    pub fn ring_dimension(&self, context: Handle) -> BindResult<u32> {
        Ok(self.context(context)?.ring_dimension())
    }

    pub fn plaintext_modulus(&self, context: Handle) -> BindResult<u64> {
        Ok(self.context(context)?.plaintext_modulus())
    }

    /// Handle to a [`BigInteger`]
    pub fn ciphertext_modulus(&self, context: Handle) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let modulus = guarded("GetModulus", || Ok(ctx.ciphertext_modulus()))?;
        Ok(self.handles.wrap(BigInteger::from(modulus)))
    }

    pub fn key_gen(&self, context: Handle) -> BindResult<KeyPairHandles> {
        let ctx = self.context(context)?;
        let pair = guarded("KeyGen", || Ok(ctx.key_gen()?))?;
        Ok(self.wrap_key_pair(pair))
    }

    pub fn public_key_tag(&self, key: Handle) -> BindResult<String> {
        Ok(self.get::<PublicKey>(key)?.key_tag().to_string())
    }

    pub fn secret_key_tag(&self, key: Handle) -> BindResult<String> {
        Ok(self.get::<SecretKey>(key)?.key_tag().to_string())
    }

    // --- plaintexts ---

    pub fn make_packed_plaintext(&self, context: Handle, values: &[i32]) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let values = widen_i32(values);
        let plaintext = guarded("MakePackedPlaintext", || Ok(ctx.make_packed_plaintext(&values)?))?;
        Ok(self.wrap_plaintext(plaintext))
    }

    pub fn make_ckks_packed_plaintext(&self, context: Handle, values: &[f64]) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let plaintext = guarded("MakeCKKSPackedPlaintext", || {
            Ok(ctx.make_ckks_packed_plaintext(values)?)
        })?;
        Ok(self.wrap_plaintext(plaintext))
    }

    pub fn plaintext_set_length(&self, plaintext: Handle, length: u32) -> BindResult<()> {
        let cell = self.get::<PlaintextCell>(plaintext)?;
        cell.write().set_length(length as usize);
        Ok(())
    }

    pub fn plaintext_length(&self, plaintext: Handle) -> BindResult<u32> {
        let cell = self.get::<PlaintextCell>(plaintext)?;
        let length = cell.read().length();
        Ok(narrow_u64(length as u64))
    }

    /// Integer slots, narrowed to `i32`
    pub fn packed_value(&self, plaintext: Handle) -> BindResult<Vec<i32>> {
        let cell = self.get::<PlaintextCell>(plaintext)?;
        let plaintext = cell.read();
        Ok(narrow_i64(plaintext.packed_value()?))
    }

    pub fn real_packed_value(&self, plaintext: Handle) -> BindResult<Vec<f64>> {
        let cell = self.get::<PlaintextCell>(plaintext)?;
        let values = cell.read().real_packed_value();
        Ok(values)
    }

    // --- encryption ---

    pub fn encrypt(&self, context: Handle, key: Handle, plaintext: Handle) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let key = self.get::<PublicKey>(key)?;
        let cell = self.get::<PlaintextCell>(plaintext)?;
        let plaintext = cell.read().clone();
        let ct = guarded("Encrypt", || Ok(ctx.encrypt(&key, &plaintext)?))?;
        Ok(self.handles.wrap(ct))
    }

    pub fn decrypt(&self, context: Handle, key: Handle, ciphertext: Handle) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let key = self.get::<SecretKey>(key)?;
        let ct = self.get::<Ciphertext>(ciphertext)?;
        let plaintext = guarded("Decrypt", || Ok(ctx.decrypt(&key, &ct)?))?;
        Ok(self.wrap_plaintext(plaintext))
    }

    // --- evaluation ---

    fn binary_op(
        &self,
        op: &'static str,
        context: Handle,
        a: Handle,
        b: Handle,
        f: impl FnOnce(&CryptoContext, &Ciphertext, &Ciphertext) -> CoreResult<Ciphertext>,
    ) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let a = self.get::<Ciphertext>(a)?;
        let b = self.get::<Ciphertext>(b)?;
        let ct = guarded(op, || Ok(f(&*ctx, &*a, &*b)?))?;
        Ok(self.handles.wrap(ct))
    }

    fn unary_op(
        &self,
        op: &'static str,
        context: Handle,
        ciphertext: Handle,
        f: impl FnOnce(&CryptoContext, &Ciphertext) -> CoreResult<Ciphertext>,
    ) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let ct = self.get::<Ciphertext>(ciphertext)?;
        let out = guarded(op, || Ok(f(&*ctx, &*ct)?))?;
        Ok(self.handles.wrap(out))
    }

    pub fn eval_add(&self, context: Handle, a: Handle, b: Handle) -> BindResult<Handle> {
        self.binary_op("EvalAdd", context, a, b, |ctx, a, b| ctx.eval_add(a, b))
    }

    pub fn eval_sub(&self, context: Handle, a: Handle, b: Handle) -> BindResult<Handle> {
        self.binary_op("EvalSub", context, a, b, |ctx, a, b| ctx.eval_sub(a, b))
    }

    pub fn eval_mult(&self, context: Handle, a: Handle, b: Handle) -> BindResult<Handle> {
        self.binary_op("EvalMult", context, a, b, |ctx, a, b| ctx.eval_mult(a, b))
    }

    pub fn eval_negate(&self, context: Handle, ciphertext: Handle) -> BindResult<Handle> {
        self.unary_op("EvalNegate", context, ciphertext, |ctx, ct| ctx.eval_negate(ct))
    }

    pub fn eval_mult_plain(&self, context: Handle, ciphertext: Handle, plaintext: Handle) -> BindResult<Handle> {
        let cell = self.get::<PlaintextCell>(plaintext)?;
        let plaintext = cell.read().clone();
        self.unary_op("EvalMult", context, ciphertext, |ctx, ct| ctx.eval_mult_plain(ct, &plaintext))
    }

    pub fn eval_mult_const(&self, context: Handle, ciphertext: Handle, constant: f64) -> BindResult<Handle> {
        self.unary_op("EvalMult", context, ciphertext, |ctx, ct| ctx.eval_mult_const(ct, constant))
    }

    pub fn eval_mult_many(&self, context: Handle, ciphertexts: &[Handle]) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let cts = self.ciphertexts(ciphertexts)?;
        let ct = guarded("EvalMultMany", || Ok(ctx.eval_mult_many(&cts)?))?;
        Ok(self.handles.wrap(ct))
    }

    pub fn eval_at_index(&self, context: Handle, ciphertext: Handle, index: i32) -> BindResult<Handle> {
        self.unary_op("EvalAtIndex", context, ciphertext, |ctx, ct| ctx.eval_at_index(ct, index))
    }

    pub fn mod_reduce(&self, context: Handle, ciphertext: Handle) -> BindResult<Handle> {
        self.unary_op("ModReduce", context, ciphertext, |ctx, ct| ctx.mod_reduce(ct))
    }

    pub fn compress(&self, context: Handle, ciphertext: Handle, towers: u32) -> BindResult<Handle> {
        self.unary_op("Compress", context, ciphertext, |ctx, ct| ctx.compress(ct, towers))
    }

    pub fn eval_sum(&self, context: Handle, ciphertext: Handle, batch: u32) -> BindResult<Handle> {
        self.unary_op("EvalSum", context, ciphertext, |ctx, ct| ctx.eval_sum(ct, batch))
    }

    pub fn eval_inner_product(&self, context: Handle, a: Handle, b: Handle, batch: u32) -> BindResult<Handle> {
        self.binary_op("EvalInnerProduct", context, a, b, |ctx, a, b| {
            ctx.eval_inner_product(a, b, batch)
        })
    }

    pub fn eval_merge(&self, context: Handle, ciphertexts: &[Handle]) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let cts = self.ciphertexts(ciphertexts)?;
        let ct = guarded("EvalMerge", || Ok(ctx.eval_merge(&cts)?))?;
        Ok(self.handles.wrap(ct))
    }

    pub fn eval_linear_wsum(&self, context: Handle, ciphertexts: &[Handle], weights: &[f64]) -> BindResult<Handle> {
        let ctx = self.context(context)?;
        let cts = self.ciphertexts(ciphertexts)?;
        let ct = guarded("EvalLinearWSum", || Ok(ctx.eval_linear_wsum(&cts, weights)?))?;
        Ok(self.handles.wrap(ct))
    }
}
