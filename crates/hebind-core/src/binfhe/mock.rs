//! Mock boolean engine for testing
//!
//! NOT SECURE - noiseless LWE over Z_q with messages scaled by q/4. The
//! refresh key carries the ring secret `z` and the switching key carries
//! `s - z` on the first `n` coordinates, so together they recover the LWE
//! secret. Bootstrapping decrypts with it, applies the gate and re-encrypts.
//! This keeps the key plumbing honest (a gate needs both keys, and they must
//! come from the same BTKeyGen) without any of the real accumulator math.

use super::{
    BINFHE_PLAINTEXT_MODULUS, BinFheMethod, BinFheParamSet, BinFheParams, BinGate, BooleanEngine,
    BootstrapKeys, LweCiphertext, LwePrivateKey, RefreshKey, SwitchingKey,
};
use crate::engine::{EngineError, EngineResult};
use crate::ids::{ContextId, KeyTag};
use rand::Rng;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

const NAME: &str = "mock-binfhe";

pub struct MockBooleanEngine;

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct SecretPayload {
    s: Vec<u64>,
}

#[derive(Serialize, Deserialize)]
struct LwePayload {
    a: Vec<u64>,
    b: u64,
}

#[derive(Serialize, Deserialize)]
struct RefreshPayload {
    z: Vec<u64>,
}

/// `delta = s - z[..n]`; `ring` is the digest of the `z` it was made against
#[derive(Serialize, Deserialize)]
struct SwitchingPayload {
    delta: Vec<u64>,
    ring: [u8; 32],
}

fn encode<T: Serialize>(value: &T, what: &'static str) -> EngineResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| EngineError::MalformedPayload {
        what,
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &'static str) -> EngineResult<T> {
    bincode::deserialize(bytes).map_err(|e| EngineError::MalformedPayload {
        what,
        reason: e.to_string(),
    })
}

fn check_len(values: &[u64], expected: u32, what: &'static str) -> EngineResult<()> {
    if values.len() != expected as usize {
        return Err(EngineError::MalformedPayload {
            what,
            reason: format!("dimension {}, expected {expected}", values.len()),
        });
    }
    Ok(())
}

fn ring_digest(z: &[u64]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for v in z {
        hasher.update(&v.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Arithmetic in Z_q
#[derive(Clone, Copy)]
struct Zq(u64);

impl Zq {
    fn add(self, a: u64, b: u64) -> u64 {
        ((a as u128 + b as u128) % self.0 as u128) as u64
    }

    fn sub(self, a: u64, b: u64) -> u64 {
        self.add(a, self.0 - b % self.0)
    }

    fn dot(self, a: &[u64], s: &[u64]) -> u64 {
        a.iter().zip(s).fold(0, |acc, (x, y)| {
            self.add(acc, ((*x as u128 * *y as u128) % self.0 as u128) as u64)
        })
    }

    /// Each coordinate drawn from {-1, 0, 1}
    fn ternary(self, n: u32) -> Vec<u64> {
        (0..n)
            .map(|_| match OsRng.gen_range(0u8..3) {
                0 => self.0 - 1,
                1 => 0,
                _ => 1,
            })
            .collect()
    }

    fn uniform(self, n: u32) -> Vec<u64> {
        (0..n).map(|_| OsRng.gen_range(0..self.0)).collect()
    }

    fn delta(self) -> u64 {
        self.0 / BINFHE_PLAINTEXT_MODULUS
    }
}

impl MockBooleanEngine {
    fn secret(&self, params: &BinFheParams, key: &LwePrivateKey, dimension: u32) -> EngineResult<SecretPayload> {
        if key.dimension() != dimension {
            return Err(EngineError::Incompatible(format!(
                "secret of dimension {}, expected {dimension}",
                key.dimension()
            )));
        }
        let payload: SecretPayload = decode(key.payload(), "LWE secret key")?;
        check_len(&payload.s, dimension, "LWE secret key")?;
        if payload.s.iter().any(|v| *v >= params.modulus) {
            return Err(EngineError::MalformedPayload {
                what: "LWE secret key",
                reason: "coordinate outside Z_q".into(),
            });
        }
        Ok(payload)
    }

    fn lwe(&self, params: &BinFheParams, ct: &LweCiphertext) -> EngineResult<LwePayload> {
        let payload: LwePayload = decode(ct.payload(), "LWE ciphertext")?;
        check_len(&payload.a, params.lattice_dim, "LWE ciphertext")?;
        Ok(payload)
    }

    /// LWE secret recovered from a refresh/switching key pair
    fn unlock(&self, params: &BinFheParams, keys: &BootstrapKeys) -> EngineResult<Vec<u64>> {
        let refresh: RefreshPayload = decode(keys.refresh.payload(), "refresh key")?;
        check_len(&refresh.z, params.ring_dim, "refresh key")?;
        let switching: SwitchingPayload = decode(keys.switching.payload(), "switching key")?;
        check_len(&switching.delta, params.lattice_dim, "switching key")?;
        if switching.ring != ring_digest(&refresh.z) {
            return Err(EngineError::IncompatibleKeyShares);
        }
        let zq = Zq(params.modulus);
        Ok(refresh
            .z
            .iter()
            .zip(&switching.delta)
            .map(|(z, d)| zq.add(*z, *d))
            .collect())
    }

    fn phase_message(params: &BinFheParams, s: &[u64], ct: &LwePayload) -> u64 {
        let zq = Zq(params.modulus);
        let phase = zq.sub(ct.b, zq.dot(&ct.a, s));
        let q = params.modulus as u128;
        let scaled = (phase as u128 * BINFHE_PLAINTEXT_MODULUS as u128 + q / 2) / q;
        (scaled % BINFHE_PLAINTEXT_MODULUS as u128) as u64
    }

    fn bit(params: &BinFheParams, s: &[u64], ct: &LwePayload) -> EngineResult<bool> {
        match Self::phase_message(params, s, ct) {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(EngineError::Incompatible(format!(
                "gate input decrypts to {other}, not a bit"
            ))),
        }
    }

    fn seal(
        params: &BinFheParams,
        context: ContextId,
        key_tag: KeyTag,
        s: &[u64],
        message: u64,
    ) -> EngineResult<LweCiphertext> {
        let zq = Zq(params.modulus);
        let a = zq.uniform(params.lattice_dim);
        let b = zq.add(zq.dot(&a, s), zq.delta() * message);
        Ok(LweCiphertext::new(context, key_tag, encode(&LwePayload { a, b }, "LWE ciphertext")?))
    }
}

impl BooleanEngine for MockBooleanEngine {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Mock dimensions only; they carry no security
    fn preset(&self, set: BinFheParamSet, method: BinFheMethod) -> EngineResult<BinFheParams> {
        use BinFheParamSet::*;
        let (lattice_dim, ring_dim, modulus) = match set {
            Toy | SignedModTest => (32, 256, 512),
            Medium => (64, 512, 1024),
            Std128Ap | Std128ApOpt | Std128 | Std128Opt | Std128Q | Std128QOpt => (128, 1024, 1024),
            Std192 | Std192Opt | Std192Q | Std192QOpt => (192, 1024, 2048),
            Std256 | Std256Opt | Std256Q | Std256QOpt => (256, 2048, 2048),
        };
        Ok(BinFheParams {
            lattice_dim,
            ring_dim,
            modulus,
            ring_modulus: 1 << 27,
            key_switch_modulus: 1 << 14,
            std_dev: 3.19,
            base_ks: 32,
            base_g: 1 << 7,
            base_r: 32,
            method,
        })
    }

    fn check_params(&self, params: &BinFheParams) -> EngineResult<()> {
        if params.modulus > u32::MAX as u64 {
            return Err(EngineError::InvalidParameters(format!(
                "LWE modulus {} exceeds 32 bits",
                params.modulus
            )));
        }
        Ok(())
    }

    fn key_gen(&self, params: &BinFheParams, context: ContextId, dimension: u32) -> EngineResult<LwePrivateKey> {
        let payload = SecretPayload {
            s: Zq(params.modulus).ternary(dimension),
        };
        let bytes = encode(&payload, "LWE secret key")?;
        Ok(LwePrivateKey::new(context, KeyTag::random(), dimension, bytes))
    }

    fn key_switch_gen(
        &self,
        params: &BinFheParams,
        secret: &LwePrivateKey,
        ring_secret: &LwePrivateKey,
    ) -> EngineResult<SwitchingKey> {
        let s = self.secret(params, secret, params.lattice_dim)?;
        let z = self.secret(params, ring_secret, params.ring_dim)?;
        let zq = Zq(params.modulus);
        let payload = SwitchingPayload {
            delta: s.s.iter().zip(&z.s).map(|(s, z)| zq.sub(*s, *z)).collect(),
            ring: ring_digest(&z.s),
        };
        Ok(SwitchingKey::new(
            secret.context(),
            secret.key_tag().clone(),
            encode(&payload, "switching key")?,
        ))
    }

    fn refresh_key_gen(
        &self,
        params: &BinFheParams,
        secret: &LwePrivateKey,
        ring_secret: &LwePrivateKey,
    ) -> EngineResult<RefreshKey> {
        let z = self.secret(params, ring_secret, params.ring_dim)?;
        Ok(RefreshKey::new(
            secret.context(),
            secret.key_tag().clone(),
            encode(&RefreshPayload { z: z.s.clone() }, "refresh key")?,
        ))
    }

    fn check_bootstrap_keys(&self, params: &BinFheParams, keys: &BootstrapKeys) -> EngineResult<()> {
        self.unlock(params, keys).map(|_| ())
    }

    fn encrypt(&self, params: &BinFheParams, secret: &LwePrivateKey, message: u64) -> EngineResult<LweCiphertext> {
        if message >= BINFHE_PLAINTEXT_MODULUS {
            return Err(EngineError::EncodingOverflow {
                value: i64::try_from(message).unwrap_or(i64::MAX),
                modulus: BINFHE_PLAINTEXT_MODULUS,
            });
        }
        let s = self.secret(params, secret, params.lattice_dim)?;
        Self::seal(params, secret.context(), secret.key_tag().clone(), &s.s, message)
    }

    fn decrypt(&self, params: &BinFheParams, secret: &LwePrivateKey, ciphertext: &LweCiphertext) -> EngineResult<u64> {
        let s = self.secret(params, secret, params.lattice_dim)?;
        let ct = self.lwe(params, ciphertext)?;
        Ok(Self::phase_message(params, &s.s, &ct))
    }

    fn eval_not(&self, params: &BinFheParams, ciphertext: &LweCiphertext) -> EngineResult<LweCiphertext> {
        let ct = self.lwe(params, ciphertext)?;
        let zq = Zq(params.modulus);
        let negated = LwePayload {
            a: ct.a.iter().map(|v| zq.sub(0, *v)).collect(),
            b: zq.sub(zq.delta(), ct.b),
        };
        Ok(LweCiphertext::new(
            ciphertext.context(),
            ciphertext.key_tag().clone(),
            encode(&negated, "LWE ciphertext")?,
        ))
    }

    fn eval_bin_gate(
        &self,
        params: &BinFheParams,
        keys: &BootstrapKeys,
        gate: BinGate,
        a: &LweCiphertext,
        b: &LweCiphertext,
    ) -> EngineResult<LweCiphertext> {
        let s = self.unlock(params, keys)?;
        let x = Self::bit(params, &s, &self.lwe(params, a)?)?;
        let y = Self::bit(params, &s, &self.lwe(params, b)?)?;
        let out = gate.apply(x, y);
        Self::seal(params, a.context(), a.key_tag().clone(), &s, u64::from(out))
    }

    fn bootstrap(
        &self,
        params: &BinFheParams,
        keys: &BootstrapKeys,
        ciphertext: &LweCiphertext,
    ) -> EngineResult<LweCiphertext> {
        let s = self.unlock(params, keys)?;
        let bit = Self::bit(params, &s, &self.lwe(params, ciphertext)?)?;
        Self::seal(
            params,
            ciphertext.context(),
            ciphertext.key_tag().clone(),
            &s,
            u64::from(bit),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> BinFheParams {
        MockBooleanEngine
            .preset(BinFheParamSet::Toy, BinFheMethod::Ginx)
            .unwrap()
    }

    fn keys(params: &BinFheParams, sk: &LwePrivateKey) -> BootstrapKeys {
        let engine = MockBooleanEngine;
        let z = engine.key_gen(params, sk.context(), params.ring_dim).unwrap();
        BootstrapKeys {
            refresh: engine.refresh_key_gen(params, sk, &z).unwrap(),
            switching: engine.key_switch_gen(params, sk, &z).unwrap(),
        }
    }

    #[test]
    fn test_presets_validate() {
        for code in 0..17u32 {
            let set = BinFheParamSet::try_from(code).unwrap();
            let params = MockBooleanEngine.preset(set, BinFheMethod::Ap).unwrap();
            params.validate().unwrap();
            MockBooleanEngine.check_params(&params).unwrap();
        }
    }

    #[test]
    fn test_encrypt_decrypt_all_messages() {
        let params = toy();
        let engine = MockBooleanEngine;
        let sk = engine.key_gen(&params, params.context_id(), params.lattice_dim).unwrap();
        for m in 0..BINFHE_PLAINTEXT_MODULUS {
            let ct = engine.encrypt(&params, &sk, m).unwrap();
            assert_eq!(engine.decrypt(&params, &sk, &ct).unwrap(), m);
        }
        assert!(matches!(
            engine.encrypt(&params, &sk, 4),
            Err(EngineError::EncodingOverflow { value: 4, modulus: 4 })
        ));
    }

    #[test]
    fn test_not_flips_bits_without_keys() {
        let params = toy();
        let engine = MockBooleanEngine;
        let sk = engine.key_gen(&params, params.context_id(), params.lattice_dim).unwrap();
        for m in [0, 1] {
            let ct = engine.encrypt(&params, &sk, m).unwrap();
            let not = engine.eval_not(&params, &ct).unwrap();
            assert_eq!(engine.decrypt(&params, &sk, &not).unwrap(), 1 - m);
        }
    }

    #[test]
    fn test_gate_rejects_non_bit_input() {
        let params = toy();
        let engine = MockBooleanEngine;
        let sk = engine.key_gen(&params, params.context_id(), params.lattice_dim).unwrap();
        let keys = keys(&params, &sk);
        let one = engine.encrypt(&params, &sk, 1).unwrap();
        let two = engine.encrypt(&params, &sk, 2).unwrap();
        assert!(matches!(
            engine.eval_bin_gate(&params, &keys, BinGate::And, &one, &two),
            Err(EngineError::Incompatible(_))
        ));
    }

    #[test]
    fn test_keys_from_different_runs_do_not_pair() {
        let params = toy();
        let engine = MockBooleanEngine;
        let sk = engine.key_gen(&params, params.context_id(), params.lattice_dim).unwrap();
        let first = keys(&params, &sk);
        let second = keys(&params, &sk);
        engine.check_bootstrap_keys(&params, &first).unwrap();

        let mixed = BootstrapKeys {
            refresh: first.refresh.clone(),
            switching: second.switching.clone(),
        };
        assert_eq!(
            engine.check_bootstrap_keys(&params, &mixed).unwrap_err(),
            EngineError::IncompatibleKeyShares
        );
    }

    #[test]
    fn test_ring_secret_cannot_encrypt() {
        let params = toy();
        let engine = MockBooleanEngine;
        let z = engine.key_gen(&params, params.context_id(), params.ring_dim).unwrap();
        assert!(matches!(engine.encrypt(&params, &z, 1), Err(EngineError::Incompatible(_))));
    }
}
