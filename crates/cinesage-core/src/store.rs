//! Embedding store trait and the in-memory dense matrix.
//!
//! Defines the interface for the persisted movie-embedding catalog.
//! Implementations (the file-backed bundle store) live in cinesage-infra.

use std::sync::Arc;

use cinesage_types::error::BundleError;
use cinesage_types::movie::{MovieId, MovieRecord};

use crate::projection::ReductionMatrix;

/// A fully materialized embedding matrix: N rows of `dim` floats each,
/// stored row-major in one contiguous buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    /// Build a matrix from a row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not a multiple of `dim`. Loaders validate
    /// this invariant before construction; hitting it here is a bug.
    pub fn new(dim: usize, data: Vec<f32>) -> Self {
        if dim == 0 {
            assert!(data.is_empty(), "dim 0 matrix must be empty");
        } else {
            assert_eq!(data.len() % dim, 0, "buffer length must be a multiple of dim");
        }
        Self { dim, data }
    }

    /// Width of every row.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    /// One row by positional index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= row_count()`; callers bounds-check first.
    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }
}

/// Trait for the read-only movie catalog with its embedding matrix.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in cinesage-infra.
///
/// Metadata accessors (`movies`, `count`, `index_of`) are synchronous and
/// must never force the embedding matrix into memory; `matrix` is the
/// single expensive, cacheable operation.
pub trait EmbeddingStore: Send + Sync {
    /// The movie table, in matrix row order.
    fn movies(&self) -> &[MovieRecord];

    /// Number of movies (and matrix rows).
    fn count(&self) -> usize {
        self.movies().len()
    }

    /// Resolve a movie id to its positional row index.
    fn index_of(&self, id: MovieId) -> Option<usize>;

    /// The reduction transform persisted with the matrix, if any.
    fn projection(&self) -> Option<&ReductionMatrix>;

    /// Materialize the full embedding matrix, dequantizing if the
    /// persisted form is quantized.
    ///
    /// Idempotent: repeated calls return the same shared matrix without
    /// re-reading or re-decoding anything.
    fn matrix(
        &self,
    ) -> impl std::future::Future<Output = Result<Arc<DenseMatrix>, BundleError>> + Send;

    /// One dequantized row by positional index, without materializing the
    /// full matrix. Out-of-bounds indices are an error.
    fn row(
        &self,
        index: usize,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, BundleError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_matrix_rows() {
        let m = DenseMatrix::new(2, vec![1.0, 0.0, 0.0, 1.0, 0.5, 0.5]);
        assert_eq!(m.dim(), 2);
        assert_eq!(m.row_count(), 3);
        assert_eq!(m.row(0), &[1.0, 0.0]);
        assert_eq!(m.row(2), &[0.5, 0.5]);
    }

    #[test]
    fn test_dense_matrix_empty() {
        let m = DenseMatrix::new(0, vec![]);
        assert_eq!(m.row_count(), 0);
    }

    #[test]
    #[should_panic(expected = "multiple of dim")]
    fn test_dense_matrix_ragged_buffer_panics() {
        DenseMatrix::new(2, vec![1.0, 2.0, 3.0]);
    }
}
