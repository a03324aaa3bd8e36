//! Handle registry: opaque integer handles over shared objects
//!
//! A handle is one counted reference to an `Arc`. Releasing the handle drops
//! that reference; the object itself lives as long as any other holder (a
//! second handle, the context registry, a running call) keeps it.

use crate::error::{BindError, BindResult};
use crate::marshal::BigInteger;
use hebind_core::{
    BinFheContext, Ciphertext, CryptoContext, EvalKey, EvalKeyMap, LweCiphertext, LwePrivateKey,
    ParameterSet, Plaintext, PublicKey, RefreshKey, SecretKey, SwitchingKey,
};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Opaque reference handed to the foreign caller. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u64);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Params,
    Context,
    PublicKey,
    SecretKey,
    Plaintext,
    Ciphertext,
    EvalKey,
    EvalKeyMap,
    BigInteger,
    BinFheContext,
    LwePrivateKey,
    LweCiphertext,
    RefreshKey,
    SwitchingKey,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Params => "CCParams",
            ObjectKind::Context => "CryptoContext",
            ObjectKind::PublicKey => "PublicKey",
            ObjectKind::SecretKey => "PrivateKey",
            ObjectKind::Plaintext => "Plaintext",
            ObjectKind::Ciphertext => "Ciphertext",
            ObjectKind::EvalKey => "EvalKey",
            ObjectKind::EvalKeyMap => "EvalKeyMap",
            ObjectKind::BigInteger => "BigInteger",
            ObjectKind::BinFheContext => "BinFHEContext",
            ObjectKind::LwePrivateKey => "LWEPrivateKey",
            ObjectKind::LweCiphertext => "LWECiphertext",
            ObjectKind::RefreshKey => "RingGSWACCKey",
            ObjectKind::SwitchingKey => "LWESwitchingKey",
        };
        f.write_str(name)
    }
}

/// Objects that can sit behind a handle
pub trait Wrappable: Any + Send + Sync {
    const KIND: ObjectKind;

    fn describe(&self) -> String;
}

/// A parameter builder shared through a handle. Setters mutate it in place.
pub struct ParamsCell(RwLock<ParameterSet>);

/// Plaintexts are the only engine object the caller may mutate (`set_length`)
pub struct PlaintextCell(RwLock<Plaintext>);

// A caught engine panic may leave a cell poisoned; its value is still whole.
macro_rules! lock_cell {
    ($($cell:ident => $inner:ty),* $(,)?) => {
        $(
            impl $cell {
                pub fn new(value: $inner) -> Self {
                    Self(RwLock::new(value))
                }

                pub fn read(&self) -> RwLockReadGuard<'_, $inner> {
                    self.0.read().unwrap_or_else(PoisonError::into_inner)
                }

                pub fn write(&self) -> RwLockWriteGuard<'_, $inner> {
                    self.0.write().unwrap_or_else(PoisonError::into_inner)
                }
            }
        )*
    };
}

lock_cell!(ParamsCell => ParameterSet, PlaintextCell => Plaintext);

impl Wrappable for ParamsCell {
    const KIND: ObjectKind = ObjectKind::Params;

    fn describe(&self) -> String {
        let params = self.read();
        let options = params.options();
        format!(
            "{} params (depth {}, ring dim {}, batch {})",
            options.family(),
            options.multiplicative_depth(),
            options.ring_dim(),
            options.batch_size()
        )
    }
}

impl Wrappable for PlaintextCell {
    const KIND: ObjectKind = ObjectKind::Plaintext;

    fn describe(&self) -> String {
        self.read().to_string()
    }
}

macro_rules! wrappable_by_display {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Wrappable for $ty {
                const KIND: ObjectKind = ObjectKind::$kind;

                fn describe(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

wrappable_by_display! {
    CryptoContext => Context,
    PublicKey => PublicKey,
    SecretKey => SecretKey,
    Ciphertext => Ciphertext,
    EvalKey => EvalKey,
    EvalKeyMap => EvalKeyMap,
    BigInteger => BigInteger,
    BinFheContext => BinFheContext,
    LwePrivateKey => LwePrivateKey,
    LweCiphertext => LweCiphertext,
    RefreshKey => RefreshKey,
    SwitchingKey => SwitchingKey,
}

/// Object-safe view of a [`Wrappable`]
trait Wrapped: Send + Sync {
    fn describe(&self) -> String;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Wrappable> Wrapped for T {
    fn describe(&self) -> String {
        Wrappable::describe(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

enum Slot {
    Live { kind: ObjectKind, object: Arc<dyn Wrapped> },
    /// Construction or decoding failed; the handle only carries why
    Empty { kind: ObjectKind, reason: String },
}

impl Slot {
    fn kind(&self) -> ObjectKind {
        match self {
            Slot::Live { kind, .. } | Slot::Empty { kind, .. } => *kind,
        }
    }
}

pub struct HandleRegistry {
    next: AtomicU64,
    slots: RwLock<HashMap<Handle, Slot>>,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slots(&self) -> RwLockReadGuard<'_, HashMap<Handle, Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn slots_mut(&self) -> RwLockWriteGuard<'_, HashMap<Handle, Slot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(&self, slot: Slot) -> Handle {
        let handle = Handle(self.next.fetch_add(1, Ordering::Relaxed));
        self.slots_mut().insert(handle, slot);
        handle
    }

    pub fn wrap<T: Wrappable>(&self, object: T) -> Handle {
        self.wrap_arc(Arc::new(object))
    }

    /// Registers another reference to an already shared object
    pub fn wrap_arc<T: Wrappable>(&self, object: Arc<T>) -> Handle {
        self.issue(Slot::Live {
            kind: T::KIND,
            object,
        })
    }

    /// Empty sentinel for an object of kind `T` that could not be produced
    pub fn wrap_empty<T: Wrappable>(&self, reason: impl Into<String>) -> Handle {
        self.issue(Slot::Empty {
            kind: T::KIND,
            reason: reason.into(),
        })
    }

    /// Second handle to the same object
    pub fn alias(&self, handle: Handle) -> BindResult<Handle> {
        let slot = {
            let slots = self.slots();
            match slots.get(&handle) {
                Some(Slot::Live { kind, object }) => Slot::Live {
                    kind: *kind,
                    object: Arc::clone(object),
                },
                Some(Slot::Empty { kind, reason }) => Slot::Empty {
                    kind: *kind,
                    reason: reason.clone(),
                },
                None => return Err(BindError::UnknownHandle(handle)),
            }
        };
        Ok(self.issue(slot))
    }

    pub fn unwrap<T: Wrappable>(&self, handle: Handle) -> BindResult<Arc<T>> {
        let slots = self.slots();
        match slots.get(&handle) {
            None => Err(BindError::UnknownHandle(handle)),
            Some(Slot::Empty { reason, .. }) => Err(BindError::EmptyHandle {
                handle,
                reason: reason.clone(),
            }),
            Some(Slot::Live { kind, object }) => {
                let actual = *kind;
                Arc::clone(object)
                    .into_any()
                    .downcast::<T>()
                    .map_err(|_| BindError::KindMismatch {
                        handle,
                        expected: T::KIND,
                        actual,
                    })
            }
        }
    }

    /// True for a live, non-empty handle
    pub fn is_valid(&self, handle: Handle) -> bool {
        matches!(self.slots().get(&handle), Some(Slot::Live { .. }))
    }

    pub fn kind(&self, handle: Handle) -> Option<ObjectKind> {
        self.slots().get(&handle).map(Slot::kind)
    }

    /// Why an empty handle is empty
    pub fn diagnostic(&self, handle: Handle) -> Option<String> {
        match self.slots().get(&handle) {
            Some(Slot::Empty { reason, .. }) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn describe(&self, handle: Handle) -> BindResult<String> {
        match self.slots().get(&handle) {
            None => Err(BindError::UnknownHandle(handle)),
            Some(Slot::Empty { kind, reason }) => Ok(format!("empty {kind}: {reason}")),
            Some(Slot::Live { object, .. }) => Ok(object.describe()),
        }
    }

    /// Holders of the object behind `handle`, this handle included
    pub fn ref_count(&self, handle: Handle) -> Option<usize> {
        match self.slots().get(&handle) {
            Some(Slot::Live { object, .. }) => Some(Arc::strong_count(object)),
            _ => None,
        }
    }

    /// Drops this handle's reference. Returns false for an unknown handle.
    pub fn release(&self, handle: Handle) -> bool {
        self.slots_mut().remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
