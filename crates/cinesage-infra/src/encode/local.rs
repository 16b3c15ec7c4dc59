//! FastEmbed-based local text encoder.
//!
//! Implements the `TextEncoder` trait from `cinesage-core` using
//! fastembed's AllMiniLML6V2 model (384 dimensions) with ONNX runtime
//! inference. The model loads lazily on first use behind a one-time-init
//! cell and is reused for the process lifetime; there is no unload path.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;

use cinesage_core::encoder::TextEncoder;
use cinesage_types::error::EncodeError;

/// Native output width of the MiniLM sentence encoder.
pub const NATIVE_DIMENSION: usize = 384;

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Local embedding encoder backed by fastembed.
///
/// Inference runs on the blocking thread pool; the model itself sits
/// behind a mutex so concurrent callers serialize at the ONNX session,
/// which is also what keeps peak memory flat.
pub struct FastEmbedEncoder {
    model: Arc<OnceCell<Mutex<TextEmbedding>>>,
}

impl FastEmbedEncoder {
    pub fn new() -> Self {
        Self {
            model: Arc::new(OnceCell::new()),
        }
    }

    /// Whether the model has been loaded by a prior encode call.
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    async fn ensure_loaded(&self) -> Result<(), EncodeError> {
        self.model
            .get_or_try_init(|| async {
                tracing::info!(model = MODEL_NAME, "loading local embedding model");
                let loaded = tokio::task::spawn_blocking(|| {
                    TextEmbedding::try_new(
                        InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                            .with_show_download_progress(false),
                    )
                })
                .await
                .map_err(|e| {
                    EncodeError::ModelUnavailable(format!("model load task failed: {e}"))
                })?
                .map_err(|e| {
                    EncodeError::ModelUnavailable(format!("failed to load model: {e}"))
                })?;
                Ok::<_, EncodeError>(Mutex::new(loaded))
            })
            .await?;
        Ok(())
    }
}

impl Default for FastEmbedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEncoder for FastEmbedEncoder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
        self.ensure_loaded().await?;

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let cell = model.get().expect("model initialized by ensure_loaded");
            let mut session = cell
                .lock()
                .map_err(|_| EncodeError::ModelUnavailable("model lock poisoned".to_string()))?;
            session
                .embed(batch, None)
                .map_err(|e| EncodeError::ModelUnavailable(format!("inference failed: {e}")))
        })
        .await
        .map_err(|e| EncodeError::ModelUnavailable(format!("inference task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        NATIVE_DIMENSION
    }
}
