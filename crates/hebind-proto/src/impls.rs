//! Wire names for every serializable kind

use crate::context::KeyMaterialBundle;
use crate::wire::Wire;
use hebind_core::{
    BinFheSnapshot, Ciphertext, ContextSnapshot, EvalKey, EvalKeyMap, LweCiphertext, LwePrivateKey, PublicKey,
    RefreshKey, SecretKey, SwitchingKey,
};

impl Wire for ContextSnapshot {
    const OBJECT_NAME: &'static str = "CryptoContext";
}

impl Wire for PublicKey {
    const OBJECT_NAME: &'static str = "PublicKey";
}

impl Wire for SecretKey {
    const OBJECT_NAME: &'static str = "PrivateKey";
}

impl Wire for Ciphertext {
    const OBJECT_NAME: &'static str = "Ciphertext";
}

impl Wire for EvalKey {
    const OBJECT_NAME: &'static str = "EvalKey";
}

impl Wire for EvalKeyMap {
    const OBJECT_NAME: &'static str = "EvalKeyMap";
}

impl Wire for KeyMaterialBundle {
    const OBJECT_NAME: &'static str = "EvalKeyBundle";
}

impl Wire for BinFheSnapshot {
    const OBJECT_NAME: &'static str = "BinFHEContext";
}

impl Wire for LwePrivateKey {
    const OBJECT_NAME: &'static str = "LWEPrivateKey";
}

impl Wire for LweCiphertext {
    const OBJECT_NAME: &'static str = "LWECiphertext";
}

impl Wire for RefreshKey {
    const OBJECT_NAME: &'static str = "RingGSWACCKey";
}

impl Wire for SwitchingKey {
    const OBJECT_NAME: &'static str = "LWESwitchingKey";
}
