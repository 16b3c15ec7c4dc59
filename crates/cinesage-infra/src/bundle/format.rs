//! On-disk bundle format: a self-describing, version-tagged bincode blob.
//!
//! The first six bytes are a fixed magic (`CSEB`) and a little-endian
//! format version, checked before the rest of the file is trusted. A
//! bundle from a newer writer fails with `UnsupportedVersion` instead of
//! crashing somewhere inside deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cinesage_core::codec;
use cinesage_core::projection::ReductionMatrix;
use cinesage_core::store::DenseMatrix;
use cinesage_types::error::BundleError;
use cinesage_types::movie::MovieRecord;

/// File magic, the first four bytes of every bundle.
pub const BUNDLE_MAGIC: [u8; 4] = *b"CSEB";

/// Format version this build reads and writes.
///
/// Version 1 stored raw f32 matrices only; version 2 added scalar
/// quantization and the optional reduction transform.
pub const BUNDLE_VERSION: u16 = 2;

/// The embedding matrix in its persisted form.
///
/// `Quantized` is the production representation (one byte per element);
/// `Float32` is kept for small catalogs and tests where exactness beats
/// size. Row order matches the movie table in the same bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StoredMatrix {
    Float32 { dim: usize, data: Vec<f32> },
    Quantized { dim: usize, data: Vec<u8> },
}

impl StoredMatrix {
    /// Width of every row.
    pub fn dim(&self) -> usize {
        match self {
            StoredMatrix::Float32 { dim, .. } | StoredMatrix::Quantized { dim, .. } => *dim,
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        let dim = self.dim();
        if dim == 0 {
            return 0;
        }
        self.buffer_len() / dim
    }

    fn buffer_len(&self) -> usize {
        match self {
            StoredMatrix::Float32 { data, .. } => data.len(),
            StoredMatrix::Quantized { data, .. } => data.len(),
        }
    }

    /// Dequantize a single row without touching the rest of the matrix.
    ///
    /// Callers bounds-check `index` against [`Self::row_count`] first.
    pub fn dequantize_row(&self, index: usize) -> Vec<f32> {
        let dim = self.dim();
        let start = index * dim;
        match self {
            StoredMatrix::Float32 { data, .. } => data[start..start + dim].to_vec(),
            StoredMatrix::Quantized { data, .. } => codec::dequantize(&data[start..start + dim]),
        }
    }

    /// Decode the whole matrix into dense f32 form.
    pub fn to_dense(&self) -> DenseMatrix {
        match self {
            StoredMatrix::Float32 { dim, data } => DenseMatrix::new(*dim, data.clone()),
            StoredMatrix::Quantized { dim, data } => {
                DenseMatrix::new(*dim, codec::dequantize(data))
            }
        }
    }
}

/// The serialized unit written by the offline stage and read at startup.
///
/// Loading is all-or-nothing: a bundle that fails any validation check is
/// rejected as corrupt rather than partially loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleFile {
    pub magic: [u8; 4],
    pub version: u16,
    pub created_at: DateTime<Utc>,
    /// Name of the model that produced the embeddings, for mismatch
    /// diagnostics when re-encoding queries.
    pub encoder_model: String,
    pub movies: Vec<MovieRecord>,
    pub matrix: StoredMatrix,
    pub projection: Option<ReductionMatrix>,
}

impl BundleFile {
    /// Serialize to the on-disk representation.
    pub fn encode(&self) -> Result<Vec<u8>, BundleError> {
        bincode::serialize(self)
            .map_err(|e| BundleError::Corrupt(format!("failed to encode bundle: {e}")))
    }

    /// Parse and validate a bundle from raw bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, BundleError> {
        if bytes.len() < 6 {
            return Err(BundleError::Corrupt(
                "file shorter than the bundle header".to_string(),
            ));
        }
        if bytes[0..4] != BUNDLE_MAGIC {
            return Err(BundleError::Corrupt("bad magic bytes".to_string()));
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != BUNDLE_VERSION {
            return Err(BundleError::UnsupportedVersion {
                found: version,
                supported: BUNDLE_VERSION,
            });
        }

        let file: BundleFile = bincode::deserialize(bytes)
            .map_err(|e| BundleError::Corrupt(format!("failed to decode bundle: {e}")))?;
        file.validate()?;
        Ok(file)
    }

    /// Internal consistency checks beyond what deserialization proves.
    fn validate(&self) -> Result<(), BundleError> {
        let dim = self.matrix.dim();
        if dim == 0 && self.matrix.buffer_len() != 0 {
            return Err(BundleError::Corrupt(
                "matrix has data but zero dimensionality".to_string(),
            ));
        }
        if dim != 0 && self.matrix.buffer_len() % dim != 0 {
            return Err(BundleError::Corrupt(format!(
                "matrix buffer of {} elements is not a multiple of dimension {dim}",
                self.matrix.buffer_len()
            )));
        }
        if self.matrix.row_count() != self.movies.len() {
            return Err(BundleError::Corrupt(format!(
                "matrix has {} rows but the movie table has {} entries",
                self.matrix.row_count(),
                self.movies.len()
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.movies.len());
        for movie in &self.movies {
            if !seen.insert(movie.id) {
                return Err(BundleError::Corrupt(format!(
                    "duplicate movie id {}",
                    movie.id
                )));
            }
        }

        if let Some(projection) = &self.projection {
            if !projection.is_well_formed() {
                return Err(BundleError::Corrupt(
                    "reduction transform buffers disagree with declared dimensions".to_string(),
                ));
            }
            if projection.output_dim != dim {
                return Err(BundleError::Corrupt(format!(
                    "reduction transform outputs {} dimensions but the matrix stores {dim}",
                    projection.output_dim
                )));
            }
        }

        Ok(())
    }
}
