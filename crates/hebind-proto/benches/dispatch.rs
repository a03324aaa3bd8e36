use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hebind_core::*;
use hebind_proto::{Codec, Format};
use std::sync::Arc;

fn setup() -> (Arc<CryptoContext>, KeyPair, Ciphertext) {
    let registry = ContextRegistry::new();
    let mut params = ParameterSet::new(SchemeFamily::Bgv);
    params.options_mut().set_plaintext_modulus(65537).unwrap();
    params.options_mut().set_ring_dim(1024).unwrap();
    let ctx = registry.gen_context(&params, Arc::new(MockEngine)).unwrap();
    ctx.enable(Feature::Pke);
    let kp = ctx.key_gen().unwrap();
    let pt = ctx.make_packed_plaintext(&[1, 2, 3, 4]).unwrap();
    let ct = ctx.encrypt(&kp.public, &pt).unwrap();
    (ctx, kp, ct)
}

fn bench_ciphertext(c: &mut Criterion) {
    let (_ctx, _kp, ct) = setup();
    let codec = Codec::default();

    for format in [Format::Binary, Format::Text] {
        let bytes = codec.encode(&ct, format).unwrap();
        c.bench_function(&format!("ciphertext_encode_{format}"), |b| {
            b.iter(|| codec.encode(black_box(&ct), format))
        });
        c.bench_function(&format!("ciphertext_decode_{format}"), |b| {
            b.iter(|| codec.decode::<Ciphertext>(black_box(&bytes), format))
        });
    }
}

fn bench_context(c: &mut Criterion) {
    let (ctx, _kp, _ct) = setup();
    let codec = Codec::default();
    let registry = ContextRegistry::new();
    let bytes = codec.encode_context(&ctx, Format::Binary, true).unwrap();

    c.bench_function("context_decode_interned", |b| {
        b.iter(|| {
            codec.decode_context(
                black_box(&bytes),
                Format::Binary,
                &registry,
                Arc::new(MockEngine),
            )
        })
    });
}

criterion_group!(benches, bench_ciphertext, bench_context);
criterion_main!(benches);
