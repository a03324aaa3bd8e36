use hebind_core::*;
use std::sync::Arc;

fn bgv_context(registry: &ContextRegistry, features: &[Feature]) -> Arc<CryptoContext> {
    let mut params = ParameterSet::new(SchemeFamily::Bgv);
    params.options_mut().set_plaintext_modulus(65537).unwrap();
    params.options_mut().set_multiplicative_depth(2).unwrap();
    params.options_mut().set_ring_dim(16).unwrap();
    let ctx = registry.gen_context(&params, Arc::new(MockEngine)).unwrap();
    for f in features {
        ctx.enable(*f);
    }
    ctx
}

fn decrypt_ints(ctx: &CryptoContext, sk: &SecretKey, ct: &Ciphertext, n: usize) -> Vec<i64> {
    let mut pt = ctx.decrypt(sk, ct).unwrap();
    pt.set_length(n);
    pt.packed_value().unwrap().to_vec()
}

#[test]
fn test_bgv_add_scenario() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke, Feature::LeveledShe]);
    let kp = ctx.key_gen().unwrap();
    assert!(kp.is_good());

    let pt = ctx.make_packed_plaintext(&[1, 2, 3]).unwrap();
    let ct = ctx.encrypt(&kp.public, &pt).unwrap();
    let sum = ctx.eval_add(&ct, &ct).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &sum, 3), vec![2, 4, 6]);
}

#[test]
fn test_eval_mult_before_key_gen_is_precondition() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke, Feature::LeveledShe]);
    let kp = ctx.key_gen().unwrap();
    let ct = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[2]).unwrap())
        .unwrap();

    let err = ctx.eval_mult(&ct, &ct).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Precondition(PreconditionError::MissingEvalKey {
            role: KeyRole::Mult,
            ..
        })
    ));

    ctx.eval_mult_key_gen(&kp.secret).unwrap();
    let sq = ctx.eval_mult(&ct, &ct).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &sq, 1), vec![4]);
}

#[test]
fn test_arithmetic_without_leveled_she_is_precondition() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke]);
    let kp = ctx.key_gen().unwrap();
    let ct = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[1]).unwrap())
        .unwrap();
    assert!(matches!(
        ctx.eval_add(&ct, &ct),
        Err(CoreError::Precondition(PreconditionError::FeatureNotEnabled(
            Feature::LeveledShe
        )))
    ));
}

#[test]
fn test_sub_negate_and_constants() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke, Feature::LeveledShe]);
    let kp = ctx.key_gen().unwrap();
    let a = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[10, 20]).unwrap())
        .unwrap();
    let b = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[1, 2]).unwrap())
        .unwrap();

    let diff = ctx.eval_sub(&a, &b).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &diff, 2), vec![9, 18]);

    let neg = ctx.eval_negate(&b).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &neg, 2), vec![-1, -2]);

    let tripled = ctx.eval_mult_const(&b, 3.0).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &tripled, 2), vec![3, 6]);

    let masked = ctx
        .eval_mult_plain(&a, &ctx.make_packed_plaintext(&[0, 2]).unwrap())
        .unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &masked, 2), vec![0, 40]);
}

#[test]
fn test_rotation_sum_and_inner_product() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(
        &registry,
        &[Feature::Pke, Feature::LeveledShe, Feature::AdvancedShe],
    );
    let kp = ctx.key_gen().unwrap();
    ctx.eval_mult_key_gen(&kp.secret).unwrap();
    ctx.eval_at_index_key_gen(&kp.secret, &[1, -1]).unwrap();
    ctx.eval_sum_key_gen(&kp.secret).unwrap();

    let a = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[1, 2, 3]).unwrap())
        .unwrap();
    let left = ctx.eval_at_index(&a, 1).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &left, 3), vec![2, 3, 0]);
    let right = ctx.eval_at_index(&a, -1).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &right, 3), vec![0, 1, 2]);

    let total = ctx.eval_sum(&a, 16).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &total, 1), vec![6]);

    let b = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[4, 5, 6]).unwrap())
        .unwrap();
    let dot = ctx.eval_inner_product(&a, &b, 16).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &dot, 1), vec![32]);

    assert!(matches!(
        ctx.eval_sum(&a, 3),
        Err(CoreError::InvalidArgument(_))
    ));
}

#[test]
fn test_merge_linear_wsum_and_mult_many() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(
        &registry,
        &[Feature::Pke, Feature::LeveledShe, Feature::AdvancedShe],
    );
    let kp = ctx.key_gen().unwrap();
    ctx.eval_mult_key_gen(&kp.secret).unwrap();
    ctx.eval_at_index_key_gen(&kp.secret, &[-1, -2]).unwrap();

    let cts: Vec<Ciphertext> = [7i64, 8, 9]
        .iter()
        .map(|v| {
            ctx.encrypt(&kp.public, &ctx.make_packed_plaintext(&[*v, 100]).unwrap())
                .unwrap()
        })
        .collect();

    let merged = ctx.eval_merge(&cts).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &merged, 4), vec![7, 8, 9, 0]);

    let wsum = ctx.eval_linear_wsum(&cts[..2], &[2.0, -1.0]).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &wsum, 2), vec![6, 100]);
    assert!(ctx.eval_linear_wsum(&cts, &[1.0]).is_err());

    let product = ctx.eval_mult_many(&cts).unwrap();
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &product, 1), vec![504]);
    assert_eq!(product.depth(), 2);
}

#[test]
fn test_mod_reduce_and_compress() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke, Feature::LeveledShe]);
    let kp = ctx.key_gen().unwrap();
    let ct = ctx
        .encrypt(&kp.public, &ctx.make_packed_plaintext(&[5]).unwrap())
        .unwrap();

    let reduced = ctx.mod_reduce(&ct).unwrap();
    assert_eq!(reduced.level(), 1);
    assert_eq!(decrypt_ints(&ctx, &kp.secret, &reduced, 1), vec![5]);

    let compressed = ctx.compress(&ct, 1).unwrap();
    assert_eq!(compressed.level(), 2);
    assert!(ctx.compress(&reduced, 3).is_err());
}

#[test]
fn test_proxy_re_encryption() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke, Feature::Pre]);
    let alice = ctx.key_gen().unwrap();
    let bob = ctx.key_gen().unwrap();
    let ct = ctx
        .encrypt(&alice.public, &ctx.make_packed_plaintext(&[11, -12]).unwrap())
        .unwrap();

    let rk = ctx.re_key_gen(&alice.secret, &bob.public).unwrap();
    let for_bob = ctx.re_encrypt(&rk, &ct).unwrap();
    assert_eq!(decrypt_ints(&ctx, &bob.secret, &for_bob, 2), vec![11, -12]);
    assert!(matches!(
        ctx.decrypt(&alice.secret, &for_bob),
        Err(CoreError::KeyMismatch { .. })
    ));
}

#[test]
fn test_ckks_round_trip() {
    let registry = ContextRegistry::new();
    let mut params = ParameterSet::new(SchemeFamily::Ckks);
    params.options_mut().set_multiplicative_depth(1).unwrap();
    params.options_mut().set_scaling_mod_size(50).unwrap();
    params.options_mut().set_batch_size(8).unwrap();
    let ctx = registry.gen_context(&params, Arc::new(MockEngine)).unwrap();
    ctx.enable(Feature::Pke);
    ctx.enable(Feature::LeveledShe);
    assert_eq!(ctx.batch_size(), 8);
    assert_eq!(ctx.plaintext_modulus(), 0);

    let kp = ctx.key_gen().unwrap();
    ctx.eval_mult_key_gen(&kp.secret).unwrap();
    let ct = ctx
        .encrypt(&kp.public, &ctx.make_ckks_packed_plaintext(&[0.5, -1.25]).unwrap())
        .unwrap();
    let sq = ctx.eval_mult(&ct, &ct).unwrap();
    let mut out = ctx.decrypt(&kp.secret, &sq).unwrap();
    out.set_length(2);
    let values = out.real_packed_value();
    assert!((values[0] - 0.25).abs() < 1e-9);
    assert!((values[1] - 1.5625).abs() < 1e-9);

    assert!(ctx.make_packed_plaintext(&[1]).is_err());
}

#[test]
fn test_foreign_context_objects_rejected() {
    let registry = ContextRegistry::new();
    let ctx = bgv_context(&registry, &[Feature::Pke]);
    let mut other_params = ParameterSet::new(SchemeFamily::Bgv);
    other_params.options_mut().set_ring_dim(32).unwrap();
    let other = registry.gen_context(&other_params, Arc::new(MockEngine)).unwrap();
    other.enable(Feature::Pke);

    let kp = other.key_gen().unwrap();
    let pt = ctx.make_packed_plaintext(&[1]).unwrap();
    assert!(matches!(
        ctx.encrypt(&kp.public, &pt),
        Err(CoreError::ContextMismatch { .. })
    ));
}

#[test]
fn test_depth_bound_keeps_snapshots_panic_free() {
    let registry = ContextRegistry::new();
    let mut params = ParameterSet::new(SchemeFamily::Bgv);
    params.options_mut().set_ring_dim(16).unwrap();
    assert!(matches!(
        params.options_mut().set_multiplicative_depth(u32::MAX),
        Err(ConfigError::InvalidValue { .. })
    ));

    params
        .options_mut()
        .set_multiplicative_depth(MAX_MULTIPLICATIVE_DEPTH)
        .unwrap();
    let ctx = registry.gen_context(&params, Arc::new(MockEngine)).unwrap();
    let snapshot = ctx.snapshot(true).unwrap();
    assert!(snapshot.precomputed.is_some());
    assert_eq!(ctx.params().tower_count(), Some(MAX_MULTIPLICATIVE_DEPTH + 1));

    // A snapshot edited past the bound is refused on restore
    let mut forged = snapshot;
    forged.params.multiplicative_depth = u32::MAX;
    forged.precomputed = None;
    assert!(matches!(
        ContextRegistry::new().restore(forged, Arc::new(MockEngine)),
        Err(CoreError::Engine(EngineError::InvalidParameters(_)))
    ));
}
