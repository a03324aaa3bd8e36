//! hebind-ffi: handle-based call surface for foreign hosts
//!
//! A host never sees a Rust object. It holds [`Handle`]s, passes primitive
//! slices and `u32` enum codes, and gets handles, primitives or a
//! [`BindError`] (with an integer [`ErrorKind`]) back.
//!
//! Boolean-circuit contexts (`binfhe_*` methods) share the same handle
//! table and are driven by a separate [`hebind_core::BooleanEngine`].
//!
//! # Architecture
//!
//! ```text
//! host
//!   └── hebind-ffi (this crate - handles, marshalling, config)
//!         ├── hebind-proto (Binary / Text serialization)
//!         └── hebind-core (contexts, keys, key-material store, engine trait)
//! ```
//!
//! # Example
//!
//! ```
//! use hebind_ffi::Bindings;
//!
//! # fn main() -> Result<(), hebind_ffi::BindError> {
//! let b = Bindings::default();
//! let params = b.new_params("BGVRNS")?;
//! b.set_plaintext_modulus(params, 65537)?;
//! b.set_multiplicative_depth(params, 2)?;
//!
//! let ctx = b.gen_crypto_context(params)?;
//! b.enable(ctx, 0x01)?; // PKE
//! b.enable(ctx, 0x08)?; // LEVELEDSHE
//!
//! let keys = b.key_gen(ctx)?;
//! let pt = b.make_packed_plaintext(ctx, &[1, 2, 3])?;
//! let ct = b.encrypt(ctx, keys.public, pt)?;
//! let sum = b.eval_add(ctx, ct, ct)?;
//!
//! let out = b.decrypt(ctx, keys.secret, sum)?;
//! b.plaintext_set_length(out, 3)?;
//! assert_eq!(b.packed_value(out)?, vec![2, 4, 6]);
//! # Ok(())
//! # }
//! ```

pub mod bindings;
pub mod config;
pub mod error;
pub mod handle;
pub mod logging;
pub mod marshal;

pub use bindings::{BACKEND_SIZE, Bindings, KeyPairHandles};
pub use config::BindingConfig;
pub use error::{BindError, BindResult, ErrorKind};
pub use handle::{Handle, HandleRegistry, ObjectKind};
pub use marshal::{BigInteger, narrow_i64, narrow_u64, widen_i32};
