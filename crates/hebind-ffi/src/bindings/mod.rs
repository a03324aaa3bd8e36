//! Foreign call surface
//!
//! Every method takes handles, primitives and `u32` enum codes, and returns
//! handles, primitives or a [`BindError`]. Engine calls run under
//! [`guarded`], so a panic inside the engine surfaces as an error instead of
//! unwinding into the host.

mod bigint;
mod binfhe;
mod context;
mod keys;
mod params;
mod serial;

use crate::config::BindingConfig;
use crate::error::{BindError, BindResult};
use crate::handle::{Handle, HandleRegistry, ObjectKind, PlaintextCell, Wrappable};
use hebind_core::{
    BinFheContext, BooleanEngine, Ciphertext, ContextRegistry, CryptoContext, HeEngine, KeyPair, MockBooleanEngine,
    MockEngine, Plaintext, PublicKey, SecretKey,
};
use hebind_proto::Codec;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::error;

/// Native integer width of the engine's plaintext arithmetic
pub const BACKEND_SIZE: u32 = 64;

/// Both halves of a generated key pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPairHandles {
    pub public: Handle,
    pub secret: Handle,
}

pub struct Bindings {
    handles: HandleRegistry,
    contexts: ContextRegistry,
    engine: Arc<dyn HeEngine>,
    boolean_engine: Arc<dyn BooleanEngine>,
    codec: Codec,
    serialize_precompute: AtomicBool,
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new(&BindingConfig::default())
    }
}

impl Bindings {
    /// Bindings over the built-in mock engine
    pub fn new(config: &BindingConfig) -> Self {
        Self::with_engine(config, Arc::new(MockEngine))
    }

    pub fn with_engine(config: &BindingConfig, engine: Arc<dyn HeEngine>) -> Self {
        Self {
            handles: HandleRegistry::new(),
            contexts: ContextRegistry::new(),
            engine,
            boolean_engine: Arc::new(MockBooleanEngine),
            codec: Codec::new(config.max_buffer_len),
            serialize_precompute: AtomicBool::new(config.serialize_precompute),
        }
    }

    /// Replaces the engine behind boolean contexts
    pub fn with_boolean_engine(mut self, engine: Arc<dyn BooleanEngine>) -> Self {
        self.boolean_engine = engine;
        self
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn backend_size(&self) -> u32 {
        BACKEND_SIZE
    }

    pub fn serialize_precompute(&self) -> bool {
        self.serialize_precompute.load(Ordering::Relaxed)
    }

    pub fn set_serialize_precompute(&self, enabled: bool) {
        self.serialize_precompute.store(enabled, Ordering::Relaxed);
    }

    /// Drops the registry's reference to every context. Contexts still held
    /// through a handle stay alive.
    pub fn release_all_contexts(&self) -> usize {
        self.contexts.release_all_contexts()
    }

    // --- handle bookkeeping ---

    pub fn release(&self, handle: Handle) -> bool {
        self.handles.release(handle)
    }

    pub fn alias(&self, handle: Handle) -> BindResult<Handle> {
        self.handles.alias(handle)
    }

    pub fn is_valid(&self, handle: Handle) -> bool {
        self.handles.is_valid(handle)
    }

    pub fn kind(&self, handle: Handle) -> Option<ObjectKind> {
        self.handles.kind(handle)
    }

    pub fn diagnostic(&self, handle: Handle) -> Option<String> {
        self.handles.diagnostic(handle)
    }

    /// Printable form of the object behind `handle`
    pub fn describe(&self, handle: Handle) -> BindResult<String> {
        self.handles.describe(handle)
    }

    /// Both handles live and holding halves of the same key pair
    pub fn key_pair_is_good(&self, pair: &KeyPairHandles) -> bool {
        match (self.get::<PublicKey>(pair.public), self.get::<SecretKey>(pair.secret)) {
            (Ok(public), Ok(secret)) => KeyPair {
                public: (*public).clone(),
                secret: (*secret).clone(),
            }
            .is_good(),
            _ => false,
        }
    }

    // --- shared helpers ---

    fn get<T: Wrappable>(&self, handle: Handle) -> BindResult<Arc<T>> {
        self.handles.unwrap::<T>(handle)
    }

    fn context(&self, handle: Handle) -> BindResult<Arc<CryptoContext>> {
        self.get::<CryptoContext>(handle)
    }

    fn binfhe_context(&self, handle: Handle) -> BindResult<Arc<BinFheContext>> {
        self.get::<BinFheContext>(handle)
    }

    fn ciphertexts(&self, handles: &[Handle]) -> BindResult<Vec<Ciphertext>> {
        handles
            .iter()
            .map(|h| self.get::<Ciphertext>(*h).map(|ct| (*ct).clone()))
            .collect()
    }

    fn wrap_key_pair(&self, pair: KeyPair) -> KeyPairHandles {
        KeyPairHandles {
            public: self.handles.wrap(pair.public),
            secret: self.handles.wrap(pair.secret),
        }
    }

    fn wrap_ciphertexts(&self, ciphertexts: Vec<Ciphertext>) -> Vec<Handle> {
        ciphertexts.into_iter().map(|ct| self.handles.wrap(ct)).collect()
    }

    fn wrap_plaintext(&self, plaintext: Plaintext) -> Handle {
        self.handles.wrap(PlaintextCell::new(plaintext))
    }
}

/// Runs `f`, turning a panic into [`BindError::Engine`]
pub(crate) fn guarded<T>(op: &'static str, f: impl FnOnce() -> BindResult<T>) -> BindResult<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".into());
            error!(op, %message, "engine call panicked");
            Err(BindError::Engine(format!("{op}: {message}")))
        }
    }
}
