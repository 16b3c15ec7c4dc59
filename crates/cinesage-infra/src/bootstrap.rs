//! Engine assembly.
//!
//! Wires the concrete infrastructure pieces into a
//! [`RecommendationEngine`]: open the bundle, build the local (and
//! optional remote) encoder, hand the bundle's reduction transform to the
//! arbitration layer, and construct the engine with everything passed in
//! explicitly. Callers that serve concurrent requests hold the result in
//! a one-time-init cell; nothing here is ambient global state.

use std::sync::Arc;
use std::time::Duration;

use cinesage_core::encoder::TextEncoder;
use cinesage_core::encoder::boxed::BoxEncoder;
use cinesage_core::encoder::gate::QueryEncoder;
use cinesage_core::engine::RecommendationEngine;
use cinesage_core::store::EmbeddingStore;
use cinesage_types::config::EngineConfig;
use cinesage_types::error::BundleError;

use crate::bundle::FileBundleStore;
use crate::config::default_data_dir;
use crate::encode::{FastEmbedEncoder, RemoteEncoder};
use crate::memory::ProcStatusGauge;

/// Build a fully wired recommendation engine from configuration.
///
/// Fails only when the bundle cannot be loaded; encoder backends are
/// constructed lazily and degrade at query time, never here.
pub async fn build_engine(
    config: &EngineConfig,
) -> Result<RecommendationEngine<FileBundleStore>, BundleError> {
    let data_dir = default_data_dir();
    let store = Arc::new(
        FileBundleStore::open(&config.bundle_path, data_dir.as_deref()).await?,
    );

    let local = FastEmbedEncoder::new();
    if store.encoder_model() != local.model_name() {
        tracing::warn!(
            bundle_model = store.encoder_model(),
            local_model = local.model_name(),
            "bundle was built with a different encoder model"
        );
    }

    let remote = config.embed_endpoint.as_ref().map(|endpoint| {
        BoxEncoder::new(RemoteEncoder::new(
            endpoint.clone(),
            store.encoder_model().to_string(),
            local.dimension(),
            Duration::from_secs(config.embed_timeout_secs),
            config.embed_retries,
        ))
    });

    let projection = store.projection().cloned().map(Arc::new);
    let encoder = QueryEncoder::new(
        BoxEncoder::new(local),
        remote,
        Box::new(ProcStatusGauge),
        projection,
        config.keyword_only,
        config.memory_ceiling_bytes,
    );

    Ok(RecommendationEngine::new(store, encoder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::write_bundle;
    use cinesage_types::movie::{MovieId, MovieRecord};

    fn movie(id: u32, title: &str) -> MovieRecord {
        MovieRecord {
            id: MovieId(id),
            title: title.to_string(),
            year: Some(2010),
            genres: vec!["Sci-Fi".to_string()],
            avg_rating: 4.2,
            rating_count: 900,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_build_engine_missing_bundle_fails() {
        let config = EngineConfig {
            bundle_path: "definitely_missing_bundle.bin".into(),
            ..EngineConfig::default()
        };
        let err = build_engine(&config).await.unwrap_err();
        assert!(matches!(err, BundleError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_build_engine_serves_keyword_only_queries() {
        // Keyword-only mode never touches the local model, so the full
        // pipeline is exercisable without model downloads. The bundle
        // stores 384-wide rows to match the local encoder's fallback
        // dimension.
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bundle.bin");

        let mut row_a = vec![0.0_f32; 384];
        row_a[0] = 1.0;
        let mut row_b = vec![0.0_f32; 384];
        row_b[1] = 1.0;
        write_bundle(
            &path,
            vec![movie(1, "Inception"), movie(2, "The Matrix")],
            &[row_a, row_b],
            None,
            "sentence-transformers/all-MiniLM-L6-v2",
            true,
        )
        .await
        .unwrap();

        let config = EngineConfig {
            keyword_only: true,
            bundle_path: path,
            ..EngineConfig::default()
        };
        let engine = build_engine(&config).await.unwrap();

        let results = engine.recommend_by_query("dream heist", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.score == 0.0));
        assert_eq!(results[0].movie.id, MovieId(1));

        let found = engine.search_titles("matrix", 10);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, MovieId(2));
    }
}
