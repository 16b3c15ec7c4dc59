//! The retrieval engine: ranked recommendations over the movie catalog.
//!
//! Composes a [`QueryEncoder`] and an [`EmbeddingStore`] to answer three
//! queries: rank the catalog against a free-text query, rank it against a
//! reference movie, and find movies by title substring. Results carry a
//! similarity bucket label; an optional external collaborator can attach
//! third-party metadata per result.
//!
//! Ranking is deterministic: similarity descending, ties broken by
//! original row index ascending. No minimum-similarity threshold is
//! enforced -- the zero-vector fallback must still produce a full result
//! page, not an empty one.

use std::sync::Arc;

use cinesage_types::error::{CodecError, EnrichError, RetrievalError};
use cinesage_types::movie::{
    CandidateTitle, EnrichedTitle, MatchQuality, MovieId, MovieRecord, Recommendation, TitleKind,
};

use crate::codec::cosine_similarity;
use crate::encoder::gate::QueryEncoder;
use crate::store::{DenseMatrix, EmbeddingStore};

/// Trait for the external title-lookup collaborator.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live outside this crate; failures are absorbed
/// per-item by [`RecommendationEngine::enrich`].
pub trait TitleEnricher: Send + Sync {
    /// Search the external catalog by title, returning candidate records.
    fn search_titles(
        &self,
        title: &str,
    ) -> impl std::future::Future<Output = Result<Vec<CandidateTitle>, EnrichError>> + Send;

    /// Fetch full details for one candidate by its external id.
    fn title_details(
        &self,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<EnrichedTitle, EnrichError>> + Send;
}

/// Embedding-backed movie recommendation engine.
pub struct RecommendationEngine<S: EmbeddingStore> {
    store: Arc<S>,
    encoder: QueryEncoder,
}

impl<S: EmbeddingStore + std::fmt::Debug> std::fmt::Debug for RecommendationEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: EmbeddingStore> RecommendationEngine<S> {
    pub fn new(store: Arc<S>, encoder: QueryEncoder) -> Self {
        Self { store, encoder }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rank the whole catalog against a free-text query.
    ///
    /// Returns the top `k` movies (or fewer if `k` exceeds the catalog),
    /// each with its similarity score and bucket label. Near-zero matches
    /// are returned too: when the encoder degrades to the zero-vector
    /// fallback, every score is 0 and the page preserves catalog order.
    pub async fn recommend_by_query(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Recommendation>, RetrievalError> {
        if k == 0 || self.store.count() == 0 {
            return Ok(Vec::new());
        }

        let encoded = self.encoder.encode_query(query, true).await?;
        let matrix = self.store.matrix().await?;
        if encoded.vector.len() != matrix.dim() {
            return Err(CodecError::DimensionMismatch {
                expected: matrix.dim(),
                actual: encoded.vector.len(),
            }
            .into());
        }

        let ranked = rank_rows(&matrix, &encoded.vector, None, k);
        Ok(self.build_recommendations(ranked))
    }

    /// Rank the catalog against a reference movie.
    ///
    /// Unknown ids yield an empty page, not an error. The reference movie
    /// itself is excluded from the candidate set before truncation.
    pub async fn recommend_similar(
        &self,
        id: MovieId,
        k: usize,
    ) -> Result<Vec<Recommendation>, RetrievalError> {
        let Some(reference_index) = self.store.index_of(id) else {
            tracing::debug!(movie = %id, "similar-movies lookup for unknown id");
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let reference = self.store.row(reference_index).await?;
        let matrix = self.store.matrix().await?;

        let ranked = rank_rows(&matrix, &reference, Some(reference_index), k);
        Ok(self.build_recommendations(ranked))
    }

    /// Case-insensitive title substring search.
    ///
    /// No similarity scoring: matches come back in original table order,
    /// truncated to `limit`.
    pub fn search_titles(&self, term: &str, limit: usize) -> Vec<MovieRecord> {
        let needle = term.to_lowercase();
        self.store
            .movies()
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Attach third-party metadata to each recommendation via the
    /// external collaborator.
    ///
    /// One failed lookup never aborts the batch: the item is skipped with
    /// a warning and enrichment continues.
    pub async fn enrich<E: TitleEnricher>(&self, results: &mut [Recommendation], enricher: &E) {
        for rec in results.iter_mut() {
            let candidates = match enricher.search_titles(&rec.movie.title).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(movie = %rec.movie.id, "enrichment search failed: {err}, skipping");
                    continue;
                }
            };

            let Some(best) = pick_best_candidate(&rec.movie, &candidates) else {
                tracing::debug!(movie = %rec.movie.id, "no enrichment candidate matched");
                continue;
            };

            match enricher.title_details(&best.external_id).await {
                Ok(details) => rec.enrichment = Some(details),
                Err(err) => {
                    tracing::warn!(movie = %rec.movie.id, "enrichment details failed: {err}, skipping");
                }
            }
        }
    }

    fn build_recommendations(&self, ranked: Vec<(usize, f32)>) -> Vec<Recommendation> {
        let movies = self.store.movies();
        ranked
            .into_iter()
            .enumerate()
            .map(|(position, (index, score))| {
                let quality = MatchQuality::from_score(score);
                Recommendation {
                    movie: movies[index].clone(),
                    score,
                    rank: position + 1,
                    quality,
                    explanation: quality.label(score),
                    enrichment: None,
                }
            })
            .collect()
    }
}

/// Score every row against the query vector and return the top `k`
/// (index, score) pairs.
///
/// Sort order is total: similarity descending, then original index
/// ascending, so equal scores (the all-zero fallback makes every score
/// equal) keep catalog order.
fn rank_rows(
    matrix: &DenseMatrix,
    query: &[f32],
    exclude: Option<usize>,
    k: usize,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = (0..matrix.row_count())
        .filter(|&i| Some(i) != exclude)
        .map(|i| (i, cosine_similarity(query, matrix.row(i))))
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(k);
    scored
}

/// Pick the best external candidate for a movie.
///
/// Candidates are scored on title agreement, release year, image
/// availability, and film-over-TV preference; the highest score wins and
/// ties keep the first candidate seen.
pub fn pick_best_candidate<'a>(
    movie: &MovieRecord,
    candidates: &'a [CandidateTitle],
) -> Option<&'a CandidateTitle> {
    let mut best: Option<(&CandidateTitle, f32)> = None;
    for candidate in candidates {
        let score = score_candidate(movie, candidate);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate, score)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

fn score_candidate(movie: &MovieRecord, candidate: &CandidateTitle) -> f32 {
    let title = movie.title.to_lowercase();
    let cand = candidate.title.to_lowercase();

    let mut score = 0.0_f32;
    if cand == title {
        score += 3.0;
    } else if cand.starts_with(&title) || title.starts_with(&cand) {
        score += 1.5;
    } else if cand.contains(&title) || title.contains(&cand) {
        score += 0.8;
    }

    if movie
        .year
        .zip(candidate.year)
        .is_some_and(|(y, cy)| y == cy)
    {
        score += 0.7;
    }

    if candidate.image_url.as_deref().is_some_and(|u| !u.is_empty()) {
        score += 0.3;
    }

    if candidate.kind == TitleKind::Film {
        score += 0.4;
    }

    score
}
