mod common;

use common::*;
use hebind_ffi::{Bindings, ErrorKind, Handle, ObjectKind};

const TOY: u32 = 0;
const MEDIUM: u32 = 1;
const STD128: u32 = 4;
const AP: u32 = 1;
const GINX: u32 = 2;

const OR: u32 = 0;
const AND: u32 = 1;
const NOR: u32 = 2;
const NAND: u32 = 3;
const XOR_FAST: u32 = 4;
const XNOR_FAST: u32 = 5;
const XOR: u32 = 6;
const XNOR: u32 = 7;

fn gate(b: &Bindings, cc: Handle, sk: Handle, code: u32, x: u32, y: u32) -> u32 {
    let cx = b.binfhe_encrypt(cc, sk, x).unwrap();
    let cy = b.binfhe_encrypt(cc, sk, y).unwrap();
    let out = b.binfhe_eval_bin_gate(cc, code, cx, cy).unwrap();
    b.binfhe_decrypt(cc, sk, out).unwrap()
}

/// (1 AND 1) OR (1 AND (NOT 1)) over STD128/GINX
#[test]
fn test_boolean_circuit() {
    let b = Bindings::default();
    let cc = b.binfhe_context_gen(STD128, GINX).unwrap();
    let sk = b.binfhe_key_gen(cc).unwrap();
    b.binfhe_bt_key_gen(cc, sk).unwrap();

    let ct1 = b.binfhe_encrypt(cc, sk, 1).unwrap();
    let ct2 = b.binfhe_encrypt(cc, sk, 1).unwrap();

    let and1 = b.binfhe_eval_bin_gate(cc, AND, ct1, ct2).unwrap();
    let ct2_not = b.binfhe_eval_not(cc, ct2).unwrap();
    let and2 = b.binfhe_eval_bin_gate(cc, AND, ct2_not, ct1).unwrap();
    let result = b.binfhe_eval_bin_gate(cc, OR, and1, and2).unwrap();

    assert_eq!(b.binfhe_decrypt(cc, sk, result).unwrap(), 1);
    assert_eq!(b.binfhe_decrypt(cc, sk, and2).unwrap(), 0);
}

#[test]
fn test_every_gate_truth_table() {
    let b = Bindings::default();
    let cc = b.binfhe_context_gen(TOY, AP).unwrap();
    let sk = b.binfhe_key_gen(cc).unwrap();
    b.binfhe_bt_key_gen(cc, sk).unwrap();

    let cases: [(u32, [u32; 4]); 8] = [
        (AND, [0, 0, 0, 1]),
        (OR, [0, 1, 1, 1]),
        (NAND, [1, 1, 1, 0]),
        (NOR, [1, 0, 0, 0]),
        (XOR, [0, 1, 1, 0]),
        (XOR_FAST, [0, 1, 1, 0]),
        (XNOR, [1, 0, 0, 1]),
        (XNOR_FAST, [1, 0, 0, 1]),
    ];
    for (code, expected) in cases {
        let table = [(0, 0), (0, 1), (1, 0), (1, 1)].map(|(x, y)| gate(&b, cc, sk, code, x, y));
        assert_eq!(table, expected, "gate code {code}");
    }
}

/// Every object crosses the wire on its own and is reassembled in a second
/// binding instance, as a separate process would
#[test]
fn test_boolean_serialization_session() {
    for format in [BINARY, TEXT] {
        let b1 = Bindings::default();
        let cc1 = b1.binfhe_context_gen(TOY, GINX).unwrap();
        let sk1 = b1.binfhe_key_gen(cc1).unwrap();
        b1.binfhe_bt_key_gen(cc1, sk1).unwrap();
        let ct1 = b1.binfhe_encrypt(cc1, sk1, 1).unwrap();

        let context_buf = b1.serialize_binfhe_context(cc1, format).unwrap();
        let refresh = b1.binfhe_refresh_key(cc1).unwrap();
        let refresh_buf = b1.serialize_refresh_key(refresh, format).unwrap();
        let switching = b1.binfhe_switch_key(cc1).unwrap();
        let switch_buf = b1.serialize_switching_key(switching, format).unwrap();
        let sk_buf = b1.serialize_lwe_private_key(sk1, format).unwrap();
        let ct_buf = b1.serialize_lwe_ciphertext(ct1, format).unwrap();

        let b2 = Bindings::default();
        let cc = b2.deserialize_binfhe_context(&context_buf, format).unwrap();
        assert!(b2.is_valid(cc));
        let refresh = b2.deserialize_refresh_key(&refresh_buf, format).unwrap();
        let switching = b2.deserialize_switching_key(&switch_buf, format).unwrap();
        b2.binfhe_bt_key_load(cc, refresh, switching).unwrap();
        let sk = b2.deserialize_lwe_private_key(&sk_buf, format).unwrap();
        let ct = b2.deserialize_lwe_ciphertext(&ct_buf, format).unwrap();

        let ct2 = b2.binfhe_encrypt(cc, sk, 1).unwrap();
        let result = b2.binfhe_eval_bin_gate(cc, AND, ct, ct2).unwrap();
        assert_eq!(b2.binfhe_decrypt(cc, sk, result).unwrap(), 1);
    }
}

#[test]
fn test_gate_before_bt_key_gen_is_precondition() {
    let b = Bindings::default();
    let cc = b.binfhe_context_gen(TOY, GINX).unwrap();
    let sk = b.binfhe_key_gen(cc).unwrap();
    let ct = b.binfhe_encrypt(cc, sk, 1).unwrap();

    let err = b.binfhe_eval_bin_gate(cc, AND, ct, ct).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(b.binfhe_refresh_key(cc).unwrap_err().kind(), ErrorKind::Precondition);

    b.binfhe_bt_key_gen(cc, sk).unwrap();
    b.binfhe_bootstrap(cc, ct).unwrap();
    b.binfhe_clear_bt_keys(cc).unwrap();
    assert_eq!(b.binfhe_bootstrap(cc, ct).unwrap_err().kind(), ErrorKind::Precondition);
}

#[test]
fn test_bad_codes_are_configuration_errors() {
    let b = Bindings::default();
    assert_eq!(b.binfhe_context_gen(17, GINX).unwrap_err().kind(), ErrorKind::Configuration);
    assert_eq!(b.binfhe_context_gen(TOY, 0).unwrap_err().kind(), ErrorKind::Configuration);

    let cc = b.binfhe_context_gen(TOY, GINX).unwrap();
    let sk = b.binfhe_key_gen(cc).unwrap();
    b.binfhe_bt_key_gen(cc, sk).unwrap();
    let ct = b.binfhe_encrypt(cc, sk, 0).unwrap();
    assert_eq!(
        b.binfhe_eval_bin_gate(cc, 8, ct, ct).unwrap_err().kind(),
        ErrorKind::Configuration
    );
    assert_eq!(b.binfhe_encrypt(cc, sk, 4).unwrap_err().kind(), ErrorKind::Engine);
}

#[test]
fn test_custom_context_and_key_switch_gen() {
    let b = Bindings::default();
    let cc = b
        .binfhe_context_gen_custom(16, 64, 256, 1 << 20, 1 << 10, 3.19, 25, 1 << 5, 23, AP)
        .unwrap();
    assert_eq!(b.binfhe_method(cc).unwrap(), AP);
    assert_eq!(b.binfhe_lattice_dim(cc).unwrap(), 16);

    let sk = b.binfhe_key_gen(cc).unwrap();
    let sk_n = b.binfhe_key_gen_n(cc).unwrap();
    let switching = b.binfhe_key_switch_gen(cc, sk, sk_n).unwrap();
    assert_eq!(b.kind(switching), Some(ObjectKind::SwitchingKey));
    assert!(b.describe(sk).unwrap().starts_with("LWEPrivateKey("));

    // a ring secret is not an LWE encryption key
    assert!(b.binfhe_encrypt(cc, sk_n, 1).is_err());

    let err = b
        .binfhe_context_gen_custom(16, 60, 256, 1 << 20, 1 << 10, 3.19, 25, 1 << 5, 23, AP)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_boolean_objects_stay_apart() {
    let b = Bindings::default();
    let toy = b.binfhe_context_gen(TOY, GINX).unwrap();
    let medium = b.binfhe_context_gen(MEDIUM, GINX).unwrap();
    let sk = b.binfhe_key_gen(toy).unwrap();
    b.binfhe_bt_key_gen(medium, b.binfhe_key_gen(medium).unwrap()).unwrap();
    let ct = b.binfhe_encrypt(toy, sk, 1).unwrap();

    assert_eq!(b.binfhe_eval_not(medium, ct).unwrap_err().kind(), ErrorKind::Cryptographic);

    let refresh = b.binfhe_refresh_key(medium).unwrap();
    let switching = b.binfhe_switch_key(medium).unwrap();
    assert_eq!(
        b.binfhe_bt_key_load(toy, refresh, switching).unwrap_err().kind(),
        ErrorKind::Cryptographic
    );
    // argument order matters: the switching key handle is not a refresh key
    assert_eq!(
        b.binfhe_bt_key_load(medium, switching, refresh).unwrap_err().kind(),
        ErrorKind::Handle
    );

    let junk = b.deserialize_binfhe_context(b"not a context", BINARY).unwrap();
    assert!(!b.is_valid(junk));
    assert_eq!(b.kind(junk), Some(ObjectKind::BinFheContext));
}
