//! Encoding arbitration: semantic model vs. zero-vector fallback.
//!
//! `QueryEncoder` decides, per call, whether a query may be encoded with
//! a real semantic model or must degrade to the all-zero fallback:
//!
//! 1. Keyword-only mode always falls back.
//! 2. Otherwise, a configured remote backend is tried first (it needs no
//!    local memory headroom; its warm-up retry loop lives inside the
//!    backend itself).
//! 3. The local model runs only if projected process memory (current
//!    resident size plus a load-overhead estimate) stays under the
//!    configured ceiling. Any backend failure degrades to the fallback
//!    with a warning; encoding never surfaces a backend error.
//! 4. Semantic outputs are projected through the active reduction
//!    transform so query vectors stay commensurate with stored rows.
//!
//! Zero vectors make every cosine similarity 0, which downstream callers
//! must read as "no semantic signal", not as a meaningful ranking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cinesage_types::error::CodecError;

use crate::projection::ReductionMatrix;

use super::boxed::BoxEncoder;

/// Estimated extra memory needed to load the local model fresh (ONNX
/// weights plus runtime buffers). Conservative overestimate.
pub const MODEL_LOAD_OVERHEAD_BYTES: u64 = 256 * 1024 * 1024;

/// Estimated extra memory for one encode call once the model is already
/// resident.
pub const MODEL_RESIDENT_OVERHEAD_BYTES: u64 = 16 * 1024 * 1024;

/// Trait for reading the current process's resident memory.
///
/// `None` means the platform cannot measure it, in which case the safety
/// check passes. Implementations live in cinesage-infra.
pub trait MemoryGauge: Send + Sync {
    fn resident_bytes(&self) -> Option<u64>;
}

/// How a query vector was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    /// A real semantic model produced the vector.
    Semantic,
    /// The degenerate all-zero fallback was used.
    Fallback,
}

/// An encoded query vector plus its provenance.
///
/// The provenance stays at this seam: the engine's public results carry
/// only scores, so callers see the same ambiguity either way.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedQuery {
    pub vector: Vec<f32>,
    pub source: EncodingSource,
}

/// Memory-aware encoder arbitration.
pub struct QueryEncoder {
    keyword_only: bool,
    memory_ceiling_bytes: u64,
    gauge: Box<dyn MemoryGauge>,
    local: BoxEncoder,
    remote: Option<BoxEncoder>,
    projection: Option<Arc<ReductionMatrix>>,
    /// Flips after the first successful local encode; later safety checks
    /// then use the small resident-overhead estimate.
    model_resident: AtomicBool,
}

impl QueryEncoder {
    pub fn new(
        local: BoxEncoder,
        remote: Option<BoxEncoder>,
        gauge: Box<dyn MemoryGauge>,
        projection: Option<Arc<ReductionMatrix>>,
        keyword_only: bool,
        memory_ceiling_bytes: u64,
    ) -> Self {
        Self {
            keyword_only,
            memory_ceiling_bytes,
            gauge,
            local,
            remote,
            projection,
            model_resident: AtomicBool::new(false),
        }
    }

    /// The dimensionality of every vector this encoder returns: the
    /// reduced width when a transform is active, else the local model's
    /// native width.
    pub fn effective_dimension(&self) -> usize {
        self.projection
            .as_ref()
            .map(|p| p.output_dim)
            .unwrap_or_else(|| self.local.dimension())
    }

    /// Encode a single query text. See [`Self::encode_batch`].
    pub async fn encode_query(
        &self,
        text: &str,
        force_semantic: bool,
    ) -> Result<EncodedQuery, CodecError> {
        let mut batch = self
            .encode_batch(&[text.to_string()], force_semantic)
            .await?;
        Ok(batch.remove(0))
    }

    /// Encode a batch of texts, one result per input.
    ///
    /// The only error this can return is a dimensionality mismatch
    /// between a semantic output and the reduction transform, which means
    /// the deployed model and the persisted bundle disagree -- fatal, not
    /// recoverable. Every backend failure is absorbed into the fallback.
    pub async fn encode_batch(
        &self,
        texts: &[String],
        force_semantic: bool,
    ) -> Result<Vec<EncodedQuery>, CodecError> {
        if self.keyword_only {
            tracing::debug!("keyword-only mode active, using fallback encoding");
            return Ok(self.fallback_batch(texts.len()));
        }

        if !force_semantic {
            return Ok(self.fallback_batch(texts.len()));
        }

        if let Some(remote) = &self.remote {
            match remote.encode(texts).await {
                Ok(raw) if raw.len() == texts.len() => {
                    return self.finish_semantic(raw);
                }
                Ok(raw) => {
                    tracing::warn!(
                        expected = texts.len(),
                        got = raw.len(),
                        "remote encoder returned wrong batch size, trying local"
                    );
                }
                Err(err) => {
                    tracing::warn!("remote encoding failed: {err}, trying local");
                }
            }
        }

        if !self.memory_check_passes() {
            tracing::warn!(
                ceiling_bytes = self.memory_ceiling_bytes,
                "memory ceiling would be exceeded by the local model, using fallback encoding"
            );
            return Ok(self.fallback_batch(texts.len()));
        }

        match self.local.encode(texts).await {
            Ok(raw) if raw.len() == texts.len() => {
                self.model_resident.store(true, Ordering::Relaxed);
                self.finish_semantic(raw)
            }
            Ok(raw) => {
                tracing::warn!(
                    expected = texts.len(),
                    got = raw.len(),
                    "local encoder returned wrong batch size, using fallback encoding"
                );
                Ok(self.fallback_batch(texts.len()))
            }
            Err(err) => {
                tracing::warn!("local encoding failed: {err}, using fallback encoding");
                Ok(self.fallback_batch(texts.len()))
            }
        }
    }

    /// Projected memory use if the local model runs now, against the
    /// ceiling. An unmeasurable platform passes.
    fn memory_check_passes(&self) -> bool {
        let overhead = if self.model_resident.load(Ordering::Relaxed) {
            MODEL_RESIDENT_OVERHEAD_BYTES
        } else {
            MODEL_LOAD_OVERHEAD_BYTES
        };

        match self.gauge.resident_bytes() {
            Some(resident) => resident.saturating_add(overhead) <= self.memory_ceiling_bytes,
            None => true,
        }
    }

    fn fallback_batch(&self, count: usize) -> Vec<EncodedQuery> {
        let dim = self.effective_dimension();
        (0..count)
            .map(|_| EncodedQuery {
                vector: vec![0.0; dim],
                source: EncodingSource::Fallback,
            })
            .collect()
    }

    fn finish_semantic(&self, raw: Vec<Vec<f32>>) -> Result<Vec<EncodedQuery>, CodecError> {
        raw.into_iter()
            .map(|vector| {
                let vector = match &self.projection {
                    Some(p) => p.project(&vector)?,
                    None => vector,
                };
                Ok(EncodedQuery {
                    vector,
                    source: EncodingSource::Semantic,
                })
            })
            .collect()
    }
}
