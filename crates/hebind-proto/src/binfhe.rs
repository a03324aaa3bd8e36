//! Boolean-context serialization.
//!
//! The context travels without its bootstrapping keys; refresh and switching
//! keys are serialized on their own and loaded back with `bt_key_load`.

use crate::codec::Codec;
use crate::error::{ProtoError, ProtoResult};
use crate::format::Format;
use crate::wire::Wire;
use hebind_core::{BinFheContext, BinFheSnapshot, BooleanEngine};
use std::sync::Arc;
use tracing::warn;

impl Codec {
    pub fn encode_binfhe_context(&self, ctx: &BinFheContext, format: Format) -> ProtoResult<Vec<u8>> {
        self.encode(&ctx.snapshot(), format)
    }

    /// A fresh context with no bootstrapping keys
    pub fn decode_binfhe_context(
        &self,
        bytes: &[u8],
        format: Format,
        engine: Arc<dyn BooleanEngine>,
    ) -> ProtoResult<BinFheContext> {
        let snapshot: BinFheSnapshot = self.decode(bytes, format)?;
        BinFheContext::restore(snapshot, engine).map_err(|e| {
            warn!(object = BinFheSnapshot::OBJECT_NAME, %format, error = %e, "boolean context restore failed");
            ProtoError::from(e)
        })
    }
}
