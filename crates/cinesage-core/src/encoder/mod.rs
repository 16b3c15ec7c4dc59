//! Text encoding: the backend trait and the arbitration layer.
//!
//! `TextEncoder` is the port a concrete backend (local ONNX model, remote
//! embedding service) implements. `QueryEncoder` in [`gate`] arbitrates
//! between backends and the degenerate zero-vector fallback.

pub mod boxed;
pub mod gate;

use cinesage_types::error::EncodeError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in cinesage-infra.
pub trait TextEncoder: Send + Sync {
    /// Encode one or more texts into vectors, one per input text.
    ///
    /// Batch encoding is supported for efficiency when several texts need
    /// encoding together (the offline catalog build encodes in batches).
    fn encode(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, EncodeError>> + Send;

    /// The model name behind this encoder
    /// (e.g., "sentence-transformers/all-MiniLM-L6-v2").
    fn model_name(&self) -> &str;

    /// The native dimensionality of the output vectors, before any
    /// reduction transform.
    fn dimension(&self) -> usize;
}
