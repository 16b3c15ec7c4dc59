//! Movie catalog types for CineSage.
//!
//! These types model the read-only movie table built by the offline
//! preparation stage, plus the per-query recommendation results produced
//! by the retrieval engine. Records are immutable at serving time.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Maximum number of free-form tags kept per movie.
///
/// The bundle writer truncates anything beyond this on write.
pub const MAX_TAGS: usize = 15;

/// Number of tags included when building a description for encoding.
const DESCRIPTION_TAG_LIMIT: usize = 10;

/// The dataset's integer movie identifier.
///
/// Identifiers are unique but not dense; row position in the embedding
/// matrix is tracked separately via an explicit index-to-id mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovieId(pub u32);

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-movie metadata, built once offline and read-only at serving time.
///
/// Numeric fields are deliberately narrow (f32, u32, u16): the offline
/// writer narrows wide inputs on write and the loader never widens them
/// back, keeping a large catalog cheap to hold in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub year: Option<u16>,
    pub genres: Vec<String>,
    /// Mean user rating on a 0-5 scale.
    pub avg_rating: f32,
    pub rating_count: u32,
    /// Free-form community tags, at most [`MAX_TAGS`] entries.
    pub tags: Vec<String>,
}

impl MovieRecord {
    /// Build the text description used as encoder input for this movie.
    ///
    /// Combines title, genres, year, rating, and up to ten tags into one
    /// sentence-per-field blob. Missing fields render as "Unknown" so the
    /// description shape stays uniform across the catalog.
    pub fn description(&self) -> String {
        let genres = if self.genres.is_empty() {
            "Unknown".to_string()
        } else {
            self.genres.join(", ")
        };
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let mut parts = vec![
            format!("Title: {}", self.title),
            format!("Genres: {genres}"),
            format!("Year: {year}"),
            format!(
                "Rating: {:.1}/5.0 ({} reviews)",
                self.avg_rating, self.rating_count
            ),
        ];

        if !self.tags.is_empty() {
            let tags: Vec<&str> = self
                .tags
                .iter()
                .take(DESCRIPTION_TAG_LIMIT)
                .map(String::as_str)
                .collect();
            parts.push(format!("Tags: {}", tags.join(", ")));
        }

        parts.join(". ")
    }
}

/// Similarity bucket for a recommendation score.
///
/// Thresholds are upper-exclusive: a score of exactly 0.8 is Good, not
/// Excellent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    Excellent,
    Good,
    Fair,
    Weak,
}

impl MatchQuality {
    /// Bucket a cosine similarity score.
    pub fn from_score(score: f32) -> Self {
        if score > 0.8 {
            MatchQuality::Excellent
        } else if score > 0.6 {
            MatchQuality::Good
        } else if score > 0.4 {
            MatchQuality::Fair
        } else {
            MatchQuality::Weak
        }
    }

    /// Human-readable label with the score as a percentage,
    /// e.g. `"excellent match (92%)"`.
    pub fn label(self, score: f32) -> String {
        let phrase = match self {
            MatchQuality::Excellent => "excellent match",
            MatchQuality::Good => "good match",
            MatchQuality::Fair => "fair match",
            MatchQuality::Weak => "weak match",
        };
        format!("{phrase} ({:.0}%)", score * 100.0)
    }
}

/// Preferred kind of an external candidate title.
///
/// Used by best-match selection to prefer films over TV entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleKind {
    Film,
    Series,
    Other,
}

/// One candidate returned by the external title-lookup collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateTitle {
    pub external_id: String,
    pub title: String,
    pub year: Option<u16>,
    pub image_url: Option<String>,
    pub kind: TitleKind,
}

/// Third-party metadata attached to a recommendation after enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedTitle {
    pub external_id: String,
    pub poster_url: Option<String>,
    /// External rating on the provider's own scale (typically 0-10).
    pub external_rating: Option<f32>,
    pub kind: TitleKind,
}

/// A single ranked recommendation produced by the retrieval engine.
///
/// Produced fresh per query and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub movie: MovieRecord,
    /// Cosine similarity against the query vector, in [-1, 1].
    pub score: f32,
    /// 1-based position in the ranked result list.
    pub rank: usize,
    pub quality: MatchQuality,
    /// Label with the score as a percentage, e.g. `"good match (72%)"`.
    pub explanation: String,
    /// Third-party metadata, present only after enrichment.
    pub enrichment: Option<EnrichedTitle>,
}
