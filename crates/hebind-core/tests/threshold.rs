use hebind_core::*;
use std::sync::Arc;

fn context() -> Arc<CryptoContext> {
    let registry = ContextRegistry::new();
    let mut params = ParameterSet::new(SchemeFamily::Bgv);
    params.options_mut().set_plaintext_modulus(65537).unwrap();
    params.options_mut().set_ring_dim(16).unwrap();
    let ctx = registry.gen_context(&params, Arc::new(MockEngine)).unwrap();
    for f in [
        Feature::Pke,
        Feature::KeySwitch,
        Feature::LeveledShe,
        Feature::AdvancedShe,
        Feature::Multiparty,
    ] {
        ctx.enable(f);
    }
    ctx
}

struct Parties {
    a: KeyPair,
    b: KeyPair,
    c: KeyPair,
}

fn three_parties(ctx: &CryptoContext) -> Parties {
    let a = ctx.key_gen().unwrap();
    let b = ctx.multiparty_key_gen(&a.public).unwrap();
    let c = ctx.multiparty_key_gen(&b.public).unwrap();
    Parties { a, b, c }
}

fn threshold_decrypt(ctx: &CryptoContext, p: &Parties, ct: &Ciphertext, n: usize) -> Vec<i64> {
    let lead = ctx
        .multiparty_decrypt_lead(&p.a.secret, std::slice::from_ref(ct))
        .unwrap();
    let b = ctx
        .multiparty_decrypt_main(&p.b.secret, std::slice::from_ref(ct))
        .unwrap();
    let c = ctx
        .multiparty_decrypt_main(&p.c.secret, std::slice::from_ref(ct))
        .unwrap();
    let mut pt = ctx
        .multiparty_decrypt_fusion(&[lead[0].clone(), b[0].clone(), c[0].clone()])
        .unwrap();
    pt.set_length(n);
    pt.packed_value().unwrap().to_vec()
}

#[test]
fn test_three_party_decrypt() {
    let ctx = context();
    let p = three_parties(&ctx);
    let ct = ctx
        .encrypt(&p.c.public, &ctx.make_packed_plaintext(&[4, 5, 6]).unwrap())
        .unwrap();
    assert_eq!(threshold_decrypt(&ctx, &p, &ct, 3), vec![4, 5, 6]);

    // Joint ciphertexts are not tagged with any single party's secret
    assert!(matches!(
        ctx.decrypt(&p.a.secret, &ct),
        Err(CoreError::KeyMismatch { .. })
    ));
}

#[test]
fn test_joint_sum_keys_merge_associatively() {
    let ctx = context();
    let p = three_parties(&ctx);
    let joint = p.c.public.key_tag().clone();

    ctx.eval_sum_key_gen(&p.a.secret).unwrap();
    let base = ctx.eval_sum_key_map(p.a.secret.key_tag()).unwrap();
    let share_b = ctx.multi_eval_sum_key_gen(&p.b.secret, &base, &joint).unwrap();
    let share_c = ctx.multi_eval_sum_key_gen(&p.c.secret, &base, &joint).unwrap();

    let ab_c = ctx
        .multi_add_eval_keys(
            &ctx.multi_add_eval_keys(&base, &share_b, &joint).unwrap(),
            &share_c,
            &joint,
        )
        .unwrap();
    let a_bc = ctx
        .multi_add_eval_keys(
            &base,
            &ctx.multi_add_eval_keys(&share_b, &share_c, &joint).unwrap(),
            &joint,
        )
        .unwrap();
    let c_ba = ctx
        .multi_add_eval_keys(
            &share_c,
            &ctx.multi_add_eval_keys(&share_b, &base, &joint).unwrap(),
            &joint,
        )
        .unwrap();
    assert_eq!(ab_c, a_bc);
    assert_eq!(ab_c, c_ba);

    ctx.insert_eval_sum_keys(&ab_c).unwrap();
    let ct = ctx
        .encrypt(&p.c.public, &ctx.make_packed_plaintext(&[1, 2, 3, 4]).unwrap())
        .unwrap();
    let total = ctx.eval_sum(&ct, 16).unwrap();
    assert_eq!(threshold_decrypt(&ctx, &p, &total, 1), vec![10]);
}

#[test]
fn test_joint_rotation_keys_via_store_merge() {
    let ctx = context();
    let p = three_parties(&ctx);
    let joint = p.c.public.key_tag().clone();

    ctx.eval_at_index_key_gen(&p.a.secret, &[2]).unwrap();
    let base = ctx.eval_automorphism_key_map(p.a.secret.key_tag()).unwrap();
    let share_b = ctx
        .multi_eval_at_index_key_gen(&p.b.secret, &base, &[2], &joint)
        .unwrap();
    let share_c = ctx
        .multi_eval_at_index_key_gen(&p.c.secret, &base, &[2], &joint)
        .unwrap();

    // Accumulate shares one at a time in the context's own store
    for share in [&base, &share_b, &share_c] {
        ctx.merge_eval_keys(KeyRole::Rotation, &joint, share).unwrap();
    }

    let ct = ctx
        .encrypt(&p.c.public, &ctx.make_packed_plaintext(&[1, 2, 3]).unwrap())
        .unwrap();
    let rotated = ctx.eval_at_index(&ct, 2).unwrap();
    assert_eq!(threshold_decrypt(&ctx, &p, &rotated, 2), vec![3, 0]);
}

#[test]
fn test_missing_base_rotation_key_is_precondition() {
    let ctx = context();
    let p = three_parties(&ctx);
    ctx.eval_at_index_key_gen(&p.a.secret, &[1]).unwrap();
    let base = ctx.eval_automorphism_key_map(p.a.secret.key_tag()).unwrap();
    assert!(matches!(
        ctx.multi_eval_at_index_key_gen(&p.b.secret, &base, &[3], p.b.public.key_tag()),
        Err(CoreError::Precondition(PreconditionError::MissingEvalKey {
            index: 3,
            ..
        }))
    ));
}

#[test]
fn test_clear_roles_independently() {
    let ctx = context();
    let kp = ctx.key_gen().unwrap();
    ctx.eval_at_index_key_gen(&kp.secret, &[1]).unwrap();
    ctx.eval_sum_key_gen(&kp.secret).unwrap();

    ctx.clear_eval_sum_keys();
    assert!(ctx.eval_sum_key_map(kp.secret.key_tag()).is_none());
    assert!(ctx.eval_automorphism_key_map(kp.secret.key_tag()).is_some());

    ctx.clear_eval_automorphism_keys();
    assert!(ctx.eval_automorphism_key_map(kp.secret.key_tag()).is_none());
}
