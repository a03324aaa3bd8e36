use hebind_core::*;
use hebind_proto::{Codec, Format, ProtoError, deserialize, serialize};
use std::sync::Arc;

const FORMATS: [Format; 2] = [Format::Binary, Format::Text];

fn toy() -> BinFheContext {
    BinFheContext::generate(BinFheParamSet::Toy, BinFheMethod::Ginx, Arc::new(MockBooleanEngine)).unwrap()
}

/// Context, bootstrapping keys, secret key and a ciphertext each cross the
/// wire on their own; the receiver reassembles them and keeps computing.
#[test]
fn test_boolean_session_survives_serialization() {
    let codec = Codec::default();
    let cc1 = toy();
    let sk1 = cc1.key_gen().unwrap();
    cc1.bt_key_gen(&sk1).unwrap();
    let ct1 = cc1.encrypt(&sk1, 1).unwrap();

    for format in FORMATS {
        let context_bytes = codec.encode_binfhe_context(&cc1, format).unwrap();
        let refresh_bytes = serialize(&cc1.refresh_key().unwrap(), format).unwrap();
        let switch_bytes = serialize(&cc1.switch_key().unwrap(), format).unwrap();
        let sk_bytes = serialize(&sk1, format).unwrap();
        let ct_bytes = serialize(&ct1, format).unwrap();

        let cc = codec
            .decode_binfhe_context(&context_bytes, format, Arc::new(MockBooleanEngine))
            .unwrap();
        assert_eq!(cc.id(), cc1.id());
        assert!(!cc.has_bootstrap_keys());

        let refresh: RefreshKey = deserialize(&refresh_bytes, format).unwrap();
        let switching: SwitchingKey = deserialize(&switch_bytes, format).unwrap();
        cc.bt_key_load(refresh, switching).unwrap();

        let sk: LwePrivateKey = deserialize(&sk_bytes, format).unwrap();
        assert_eq!(sk, sk1);
        let ct: LweCiphertext = deserialize(&ct_bytes, format).unwrap();

        let ct2 = cc.encrypt(&sk, 1).unwrap();
        let result = cc.eval_bin_gate(BinGate::And, &ct, &ct2).unwrap();
        assert_eq!(cc.decrypt(&sk, &result).unwrap(), 1);
    }
}

#[test]
fn test_boolean_objects_are_not_interchangeable() {
    let cc = toy();
    let sk = cc.key_gen().unwrap();
    cc.bt_key_gen(&sk).unwrap();
    let refresh = serialize(&cc.refresh_key().unwrap(), Format::Binary).unwrap();

    let err = deserialize::<SwitchingKey>(&refresh, Format::Binary).unwrap_err();
    assert!(matches!(
        err,
        ProtoError::UnexpectedObject {
            expected: "LWESwitchingKey",
            ..
        }
    ));

    let ct = serialize(&cc.encrypt(&sk, 0).unwrap(), Format::Text).unwrap();
    assert!(deserialize::<LwePrivateKey>(&ct, Format::Text).is_err());
    assert!(deserialize::<LweCiphertext>(&ct, Format::Binary).is_err());
}

#[test]
fn test_boolean_context_from_other_engine_rejected() {
    let codec = Codec::default();
    let cc = toy();
    let mut snapshot = cc.snapshot();
    snapshot.engine = "openfhe".into();
    let bytes = serialize(&snapshot, Format::Text).unwrap();

    let err = codec
        .decode_binfhe_context(&bytes, Format::Text, Arc::new(MockBooleanEngine))
        .err()
        .unwrap();
    assert!(matches!(err, ProtoError::Core(CoreError::EngineMismatch { .. })));
}

#[test]
fn test_keys_from_another_context_do_not_load() {
    let codec = Codec::default();
    let cc1 = toy();
    let sk1 = cc1.key_gen().unwrap();
    cc1.bt_key_gen(&sk1).unwrap();

    let medium =
        BinFheContext::generate(BinFheParamSet::Medium, BinFheMethod::Ginx, Arc::new(MockBooleanEngine))
            .unwrap();
    let bytes = codec.encode_binfhe_context(&medium, Format::Binary).unwrap();
    let cc = codec
        .decode_binfhe_context(&bytes, Format::Binary, Arc::new(MockBooleanEngine))
        .unwrap();

    let err = cc
        .bt_key_load(cc1.refresh_key().unwrap(), cc1.switch_key().unwrap())
        .unwrap_err();
    assert!(matches!(err, CoreError::ContextMismatch { .. }));
    assert!(!cc.has_bootstrap_keys());
}
