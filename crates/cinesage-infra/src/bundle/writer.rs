//! Bundle writer for the offline preparation stage.
//!
//! Takes the prepared movie table and its embeddings, narrows metadata to
//! the serving widths, quantizes the matrix, and writes the versioned
//! bundle atomically (temp file then rename) so a crashed build never
//! leaves a half-written bundle behind.

use std::path::Path;

use chrono::Utc;

use cinesage_core::codec;
use cinesage_core::projection::ReductionMatrix;
use cinesage_types::error::BundleError;
use cinesage_types::movie::{MAX_TAGS, MovieRecord};

use super::format::{BUNDLE_MAGIC, BUNDLE_VERSION, BundleFile, StoredMatrix};

/// Write a bundle to `path`.
///
/// `embeddings` must have one row per movie, all rows the same width; the
/// rows are expected to already be in reduced space when `projection` is
/// given. With `quantize` set, elements are compressed to one byte each.
pub async fn write_bundle(
    path: &Path,
    movies: Vec<MovieRecord>,
    embeddings: &[Vec<f32>],
    projection: Option<ReductionMatrix>,
    encoder_model: &str,
    quantize: bool,
) -> Result<(), BundleError> {
    if movies.len() != embeddings.len() {
        return Err(BundleError::Corrupt(format!(
            "{} movies but {} embedding rows",
            movies.len(),
            embeddings.len()
        )));
    }

    let dim = embeddings.first().map(Vec::len).unwrap_or(0);
    for (i, row) in embeddings.iter().enumerate() {
        if row.len() != dim {
            return Err(BundleError::Corrupt(format!(
                "embedding row {i} has width {}, expected {dim}",
                row.len()
            )));
        }
    }

    let movies: Vec<MovieRecord> = movies.into_iter().map(narrow_record).collect();

    let matrix = if quantize {
        let mut data = Vec::with_capacity(movies.len() * dim);
        for row in embeddings {
            data.extend(codec::quantize(row));
        }
        StoredMatrix::Quantized { dim, data }
    } else {
        StoredMatrix::Float32 {
            dim,
            data: embeddings.iter().flatten().copied().collect(),
        }
    };

    let file = BundleFile {
        magic: BUNDLE_MAGIC,
        version: BUNDLE_VERSION,
        created_at: Utc::now(),
        encoder_model: encoder_model.to_string(),
        movies,
        matrix,
        projection,
    };
    let bytes = file.encode()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;

    tracing::info!(
        path = %path.display(),
        movies = file.movies.len(),
        bytes = bytes.len(),
        quantized = quantize,
        "embedding bundle written"
    );
    Ok(())
}

/// Enforce the serving-time width limits on one record.
///
/// Ratings are clamped into the 0-5 scale and tags truncated to the
/// stored maximum. Field widths themselves are fixed by the types.
fn narrow_record(mut movie: MovieRecord) -> MovieRecord {
    movie.avg_rating = movie.avg_rating.clamp(0.0, 5.0);
    movie.tags.truncate(MAX_TAGS);
    movie
}
