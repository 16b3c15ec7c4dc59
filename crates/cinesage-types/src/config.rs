//! Engine configuration types for CineSage.
//!
//! `EngineConfig` represents the top-level `config.toml` controlling the
//! operating mode, memory ceiling, bundle location, and the optional
//! remote embedding endpoint. All fields have sensible defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the retrieval engine.
///
/// Loaded from `{data_dir}/config.toml`, then overlaid with environment
/// flags (`CINESAGE_KEYWORD_ONLY`, `CINESAGE_MEMORY_CEILING_MB`,
/// `CINESAGE_EMBED_ENDPOINT`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// When true, the semantic encoder is never invoked and every query
    /// degrades to the zero-vector fallback.
    #[serde(default)]
    pub keyword_only: bool,

    /// Process memory ceiling for the local-model safety check, in bytes.
    #[serde(default = "default_memory_ceiling_bytes")]
    pub memory_ceiling_bytes: u64,

    /// Path of the persisted embedding bundle. Relative paths resolve
    /// against the data directory, then the current working directory.
    #[serde(default = "default_bundle_path")]
    pub bundle_path: PathBuf,

    /// Base URL of the optional remote embedding service. None disables
    /// the remote path entirely.
    #[serde(default)]
    pub embed_endpoint: Option<String>,

    /// Per-request timeout for the remote embedding call, in seconds.
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    /// How many times a warming-up remote model is retried before giving
    /// up and falling back to local encoding.
    #[serde(default = "default_embed_retries")]
    pub embed_retries: u32,
}

fn default_memory_ceiling_bytes() -> u64 {
    // Sized for a 512 MB container with headroom for the runtime.
    450 * 1024 * 1024
}

fn default_bundle_path() -> PathBuf {
    PathBuf::from("movie_bundle.bin")
}

fn default_embed_timeout_secs() -> u64 {
    20
}

fn default_embed_retries() -> u32 {
    3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            keyword_only: false,
            memory_ceiling_bytes: default_memory_ceiling_bytes(),
            bundle_path: default_bundle_path(),
            embed_endpoint: None,
            embed_timeout_secs: default_embed_timeout_secs(),
            embed_retries: default_embed_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_values() {
        let config = EngineConfig::default();
        assert!(!config.keyword_only);
        assert_eq!(config.memory_ceiling_bytes, 450 * 1024 * 1024);
        assert_eq!(config.bundle_path, PathBuf::from("movie_bundle.bin"));
        assert!(config.embed_endpoint.is_none());
        assert_eq!(config.embed_timeout_secs, 20);
        assert_eq!(config.embed_retries, 3);
    }

    #[test]
    fn test_engine_config_deserialize_empty_uses_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert!(!config.keyword_only);
        assert_eq!(config.memory_ceiling_bytes, 450 * 1024 * 1024);
    }

    #[test]
    fn test_engine_config_deserialize_with_values() {
        let config: EngineConfig = toml::from_str(
            r#"
keyword_only = true
memory_ceiling_bytes = 1073741824
bundle_path = "bundles/catalog.bin"
embed_endpoint = "https://embeddings.example.com"
embed_retries = 5
"#,
        )
        .unwrap();

        assert!(config.keyword_only);
        assert_eq!(config.memory_ceiling_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.bundle_path, PathBuf::from("bundles/catalog.bin"));
        assert_eq!(
            config.embed_endpoint.as_deref(),
            Some("https://embeddings.example.com")
        );
        assert_eq!(config.embed_retries, 5);
        assert_eq!(config.embed_timeout_secs, 20);
    }
}
