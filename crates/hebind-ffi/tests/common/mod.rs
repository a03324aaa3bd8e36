#![allow(dead_code)]

use hebind_core::{
    BigUint, Ciphertext, EngineResult, EvalKey, HeEngine, KeyPair, KeyRole, MockEngine, Plaintext, PublicKey,
    SchemeParams, SecretKey,
};
use hebind_ffi::{Bindings, Handle};

pub const PKE: u32 = 0x01;
pub const KEYSWITCH: u32 = 0x02;
pub const PRE: u32 = 0x04;
pub const LEVELEDSHE: u32 = 0x08;
pub const ADVANCEDSHE: u32 = 0x10;
pub const MULTIPARTY: u32 = 0x20;

pub const TEXT: u32 = 0;
pub const BINARY: u32 = 1;

/// BGV, t = 65537, depth 2, 16 slots
pub fn bgv_params(b: &Bindings) -> Handle {
    let params = b.new_params("BGVRNS").unwrap();
    b.set_plaintext_modulus(params, 65537).unwrap();
    b.set_multiplicative_depth(params, 2).unwrap();
    b.set_ring_dim(params, 16).unwrap();
    params
}

pub fn bgv_context(b: &Bindings, features: &[u32]) -> Handle {
    let params = bgv_params(b);
    let ctx = b.gen_crypto_context(params).unwrap();
    for f in features {
        b.enable(ctx, *f).unwrap();
    }
    b.release(params);
    ctx
}

pub fn decrypt_ints(b: &Bindings, ctx: Handle, secret: Handle, ct: Handle, n: u32) -> Vec<i32> {
    let pt = b.decrypt(ctx, secret, ct).unwrap();
    b.plaintext_set_length(pt, n).unwrap();
    let values = b.packed_value(pt).unwrap();
    b.release(pt);
    values
}

/// Mock engine that panics when asked for the ciphertext modulus
pub struct PanickyModulusEngine;

impl HeEngine for PanickyModulusEngine {
    fn name(&self) -> &'static str {
        MockEngine.name()
    }

    fn resolve(&self, params: SchemeParams) -> EngineResult<SchemeParams> {
        MockEngine.resolve(params)
    }

    fn precompute(&self, params: &SchemeParams) -> EngineResult<Vec<u8>> {
        MockEngine.precompute(params)
    }

    fn check_precomputed(&self, params: &SchemeParams, tables: &[u8]) -> EngineResult<()> {
        MockEngine.check_precomputed(params, tables)
    }

    fn ciphertext_modulus(&self, _params: &SchemeParams) -> BigUint {
        panic!("modulus chain unavailable")
    }

    fn key_gen(&self, params: &SchemeParams) -> EngineResult<KeyPair> {
        MockEngine.key_gen(params)
    }

    fn multiparty_key_gen(&self, params: &SchemeParams, joint: &PublicKey) -> EngineResult<KeyPair> {
        MockEngine.multiparty_key_gen(params, joint)
    }

    fn encode_packed(&self, params: &SchemeParams, values: &[i64]) -> EngineResult<Plaintext> {
        MockEngine.encode_packed(params, values)
    }

    fn encode_ckks_packed(&self, params: &SchemeParams, values: &[f64]) -> EngineResult<Plaintext> {
        MockEngine.encode_ckks_packed(params, values)
    }

    fn encrypt(&self, params: &SchemeParams, key: &PublicKey, plaintext: &Plaintext) -> EngineResult<Ciphertext> {
        MockEngine.encrypt(params, key, plaintext)
    }

    fn decrypt(&self, params: &SchemeParams, key: &SecretKey, ciphertext: &Ciphertext) -> EngineResult<Plaintext> {
        MockEngine.decrypt(params, key, ciphertext)
    }

    fn eval_add(&self, params: &SchemeParams, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        MockEngine.eval_add(params, a, b)
    }

    fn eval_sub(&self, params: &SchemeParams, a: &Ciphertext, b: &Ciphertext) -> EngineResult<Ciphertext> {
        MockEngine.eval_sub(params, a, b)
    }

    fn eval_negate(&self, params: &SchemeParams, ciphertext: &Ciphertext) -> EngineResult<Ciphertext> {
        MockEngine.eval_negate(params, ciphertext)
    }

    fn eval_mult(
        &self,
        params: &SchemeParams,
        relin_key: &EvalKey,
        a: &Ciphertext,
        b: &Ciphertext,
    ) -> EngineResult<Ciphertext> {
        MockEngine.eval_mult(params, relin_key, a, b)
    }

    fn eval_mult_plain(
        &self,
        params: &SchemeParams,
        ciphertext: &Ciphertext,
        plaintext: &Plaintext,
    ) -> EngineResult<Ciphertext> {
        MockEngine.eval_mult_plain(params, ciphertext, plaintext)
    }

    fn eval_mult_const(&self, params: &SchemeParams, ciphertext: &Ciphertext, constant: f64) -> EngineResult<Ciphertext> {
        MockEngine.eval_mult_const(params, ciphertext, constant)
    }

    fn eval_rotate(&self, params: &SchemeParams, key: &EvalKey, ciphertext: &Ciphertext) -> EngineResult<Ciphertext> {
        MockEngine.eval_rotate(params, key, ciphertext)
    }

    fn mod_reduce(&self, params: &SchemeParams, ciphertext: &Ciphertext) -> EngineResult<Ciphertext> {
        MockEngine.mod_reduce(params, ciphertext)
    }

    fn compress(&self, params: &SchemeParams, ciphertext: &Ciphertext, towers: u32) -> EngineResult<Ciphertext> {
        MockEngine.compress(params, ciphertext, towers)
    }

    fn eval_mult_key_gen(&self, params: &SchemeParams, secret: &SecretKey) -> EngineResult<EvalKey> {
        MockEngine.eval_mult_key_gen(params, secret)
    }

    fn rotation_key_gen(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        role: KeyRole,
        index: u32,
        base: Option<&EvalKey>,
    ) -> EngineResult<EvalKey> {
        MockEngine.rotation_key_gen(params, secret, role, index, base)
    }

    fn check_eval_key(&self, params: &SchemeParams, key: &EvalKey) -> EngineResult<()> {
        MockEngine.check_eval_key(params, key)
    }

    fn add_eval_keys(&self, params: &SchemeParams, a: &EvalKey, b: &EvalKey) -> EngineResult<EvalKey> {
        MockEngine.add_eval_keys(params, a, b)
    }

    fn re_key_gen(&self, params: &SchemeParams, secret: &SecretKey, target: &PublicKey) -> EngineResult<EvalKey> {
        MockEngine.re_key_gen(params, secret, target)
    }

    fn re_encrypt(&self, params: &SchemeParams, key: &EvalKey, ciphertext: &Ciphertext) -> EngineResult<Ciphertext> {
        MockEngine.re_encrypt(params, key, ciphertext)
    }

    fn multiparty_decrypt_share(
        &self,
        params: &SchemeParams,
        secret: &SecretKey,
        ciphertext: &Ciphertext,
        lead: bool,
    ) -> EngineResult<Ciphertext> {
        MockEngine.multiparty_decrypt_share(params, secret, ciphertext, lead)
    }

    fn multiparty_decrypt_fusion(&self, params: &SchemeParams, shares: &[Ciphertext]) -> EngineResult<Plaintext> {
        MockEngine.multiparty_decrypt_fusion(params, shares)
    }
}
