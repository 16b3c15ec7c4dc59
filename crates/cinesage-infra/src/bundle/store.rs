//! File-backed embedding store with lazy matrix materialization.
//!
//! Implements `EmbeddingStore` from `cinesage-core` over a persisted
//! bundle file. Metadata and the id-to-row maps are built eagerly at open
//! time; the dense f32 matrix is only decoded on first use, behind a
//! one-time-init cell, and shared via `Arc` afterwards.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;

use cinesage_core::projection::ReductionMatrix;
use cinesage_core::store::{DenseMatrix, EmbeddingStore};
use cinesage_types::error::BundleError;
use cinesage_types::movie::{MovieId, MovieRecord};

use super::format::{BundleFile, StoredMatrix};

/// Resolve a bundle path against the fallback chain.
///
/// Absolute paths are taken as-is. Relative paths are tried against the
/// data directory first, then the current working directory. When nothing
/// exists, the error names every attempted location.
pub fn resolve_bundle_path(
    path: &Path,
    data_dir: Option<&Path>,
) -> Result<PathBuf, BundleError> {
    let mut attempted = Vec::new();

    if path.is_absolute() {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        attempted.push(path.to_path_buf());
        return Err(BundleError::NotFound { attempted });
    }

    if let Some(dir) = data_dir {
        let candidate = dir.join(path);
        if candidate.exists() {
            return Ok(candidate);
        }
        attempted.push(candidate);
    }

    if path.exists() {
        return Ok(path.to_path_buf());
    }
    attempted.push(path.to_path_buf());

    Err(BundleError::NotFound { attempted })
}

/// Movie catalog backed by a persisted bundle file.
#[derive(Debug)]
pub struct FileBundleStore {
    movies: Vec<MovieRecord>,
    /// Explicit id-to-row mapping; row order is never treated as
    /// incidental.
    index: HashMap<MovieId, usize>,
    matrix: StoredMatrix,
    projection: Option<ReductionMatrix>,
    encoder_model: String,
    dense: OnceCell<Arc<DenseMatrix>>,
}

impl FileBundleStore {
    /// Open a bundle from disk.
    ///
    /// All-or-nothing: any validation failure rejects the whole file.
    /// Metadata access is immediate after this returns; the embedding
    /// matrix stays in its compact persisted form until first use.
    pub async fn open(
        path: impl AsRef<Path>,
        data_dir: Option<&Path>,
    ) -> Result<Self, BundleError> {
        let resolved = resolve_bundle_path(path.as_ref(), data_dir)?;
        let bytes = tokio::fs::read(&resolved).await?;
        let file = BundleFile::decode(&bytes)?;

        tracing::info!(
            path = %resolved.display(),
            movies = file.movies.len(),
            dim = file.matrix.dim(),
            reduced = file.projection.is_some(),
            "embedding bundle loaded"
        );

        Ok(Self::from_bundle(file))
    }

    /// Build a store from an already-decoded bundle.
    pub fn from_bundle(file: BundleFile) -> Self {
        let index = file
            .movies
            .iter()
            .enumerate()
            .map(|(row, movie)| (movie.id, row))
            .collect();

        Self {
            movies: file.movies,
            index,
            matrix: file.matrix,
            projection: file.projection,
            encoder_model: file.encoder_model,
            dense: OnceCell::new(),
        }
    }

    /// Name of the model that produced the stored embeddings.
    pub fn encoder_model(&self) -> &str {
        &self.encoder_model
    }
}

impl EmbeddingStore for FileBundleStore {
    fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    fn index_of(&self, id: MovieId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    fn projection(&self) -> Option<&ReductionMatrix> {
        self.projection.as_ref()
    }

    async fn matrix(&self) -> Result<Arc<DenseMatrix>, BundleError> {
        let dense = self
            .dense
            .get_or_init(|| async {
                tracing::debug!(
                    rows = self.matrix.row_count(),
                    dim = self.matrix.dim(),
                    "materializing embedding matrix"
                );
                Arc::new(self.matrix.to_dense())
            })
            .await;
        Ok(Arc::clone(dense))
    }

    async fn row(&self, index: usize) -> Result<Vec<f32>, BundleError> {
        if index >= self.matrix.row_count() {
            return Err(BundleError::RowOutOfBounds {
                index,
                count: self.matrix.row_count(),
            });
        }

        // Serve from the dense cache when it has already been built;
        // otherwise decode just this row.
        if let Some(dense) = self.dense.get() {
            return Ok(dense.row(index).to_vec());
        }
        Ok(self.matrix.dequantize_row(index))
    }
}
