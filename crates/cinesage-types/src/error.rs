use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or reading the persisted embedding bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundle file was not found at any of the attempted locations.
    #[error("embedding bundle not found; attempted: {}", format_paths(.attempted))]
    NotFound { attempted: Vec<PathBuf> },

    /// The file exists but its contents could not be trusted.
    #[error("corrupt embedding bundle: {0}")]
    Corrupt(String),

    /// The bundle was written by an incompatible format version.
    #[error("unsupported bundle version {found} (this build reads version {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },

    /// A row index beyond the end of the embedding matrix.
    #[error("row index {index} out of bounds for {count} items")]
    RowOutOfBounds { index: usize, count: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from vector codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A vector's width does not match what the operation expects.
    ///
    /// Always fatal: silently truncating or padding would corrupt every
    /// downstream similarity score.
    #[error("dimensionality mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from a text encoder backend.
///
/// These never escape the encoding arbitration layer: every variant has a
/// defined fallback (retry, switch backend, or degrade to the zero vector).
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("remote encoder error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// The remote model is still loading. Retryable with backoff.
    #[error("remote embedding model is warming up")]
    WarmingUp,
}

/// Errors from the external title enrichment collaborator.
///
/// Absorbed per item: one failed lookup never aborts the batch.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("enrichment lookup failed: {0}")]
    Upstream(String),
}

/// Errors surfaced by the retrieval engine to its caller.
///
/// Only failures with no safe fallback end up here; encoding and
/// enrichment failures are absorbed before this level.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_attempted_paths() {
        let err = BundleError::NotFound {
            attempted: vec![
                PathBuf::from("/data/movie_bundle.bin"),
                PathBuf::from("movie_bundle.bin"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("'/data/movie_bundle.bin'"));
        assert!(msg.contains("'movie_bundle.bin'"));
    }

    #[test]
    fn test_unsupported_version_display() {
        let err = BundleError::UnsupportedVersion {
            found: 9,
            supported: 2,
        };
        assert_eq!(
            err.to_string(),
            "unsupported bundle version 9 (this build reads version 2)"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = CodecError::DimensionMismatch {
            expected: 32,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "dimensionality mismatch: expected 32, got 384"
        );
    }

    #[test]
    fn test_retrieval_error_wraps_codec() {
        let err: RetrievalError = CodecError::DimensionMismatch {
            expected: 2,
            actual: 3,
        }
        .into();
        assert!(err.to_string().contains("dimensionality mismatch"));
    }
}
