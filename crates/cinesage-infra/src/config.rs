//! Engine configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.cinesage/` in
//! production) and deserializes it into [`EngineConfig`]. Falls back to
//! defaults when the file is missing or malformed, then overlays the
//! environment flags that control the operating mode.

use std::path::{Path, PathBuf};

use cinesage_types::config::EngineConfig;

/// Environment flag that disables semantic encoding entirely.
pub const ENV_KEYWORD_ONLY: &str = "CINESAGE_KEYWORD_ONLY";

/// Environment override for the memory ceiling, in megabytes.
pub const ENV_MEMORY_CEILING_MB: &str = "CINESAGE_MEMORY_CEILING_MB";

/// Environment override for the remote embedding endpoint.
pub const ENV_EMBED_ENDPOINT: &str = "CINESAGE_EMBED_ENDPOINT";

/// Default data directory (`~/.cinesage`), when the home directory is
/// resolvable.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cinesage"))
}

/// Load engine configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`EngineConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns defaults.
/// - Otherwise: the parsed config.
///
/// Environment overrides are applied on top in every case.
pub async fn load_engine_config(data_dir: &Path) -> EngineConfig {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => match toml::from_str::<EngineConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, using defaults",
                    config_path.display()
                );
                EngineConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            EngineConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    config
}

/// Overlay the process environment onto a loaded config.
pub fn apply_env_overrides(config: &mut EngineConfig) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Overlay overrides from an arbitrary variable source.
///
/// Split out from [`apply_env_overrides`] so tests can inject variables
/// without mutating the process environment.
fn apply_overrides_from(config: &mut EngineConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = lookup(ENV_KEYWORD_ONLY) {
        config.keyword_only = parse_flag(&raw);
    }

    if let Some(raw) = lookup(ENV_MEMORY_CEILING_MB) {
        match raw.parse::<u64>() {
            Ok(mb) => config.memory_ceiling_bytes = mb * 1024 * 1024,
            Err(_) => {
                tracing::warn!("Ignoring non-numeric {ENV_MEMORY_CEILING_MB}='{raw}'");
            }
        }
    }

    if let Some(endpoint) = lookup(ENV_EMBED_ENDPOINT) {
        if endpoint.is_empty() {
            config.embed_endpoint = None;
        } else {
            config.embed_endpoint = Some(endpoint);
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = load_engine_config(tmp.path()).await;
        assert!(!config.keyword_only);
        assert_eq!(config.memory_ceiling_bytes, 450 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_load_valid_toml() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            "keyword_only = true\nbundle_path = \"catalog.bin\"\n",
        )
        .await
        .unwrap();

        let config = load_engine_config(tmp.path()).await;
        assert!(config.keyword_only);
        assert_eq!(config.bundle_path, PathBuf::from("catalog.bin"));
    }

    #[tokio::test]
    async fn test_load_invalid_toml_returns_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml")
            .await
            .unwrap();

        let config = load_engine_config(tmp.path()).await;
        assert!(!config.keyword_only);
    }

    #[test]
    fn test_override_keyword_only() {
        let mut config = EngineConfig::default();
        apply_overrides_from(&mut config, lookup(&[(ENV_KEYWORD_ONLY, "true")]));
        assert!(config.keyword_only);

        apply_overrides_from(&mut config, lookup(&[(ENV_KEYWORD_ONLY, "0")]));
        assert!(!config.keyword_only);
    }

    #[test]
    fn test_override_memory_ceiling() {
        let mut config = EngineConfig::default();
        apply_overrides_from(&mut config, lookup(&[(ENV_MEMORY_CEILING_MB, "512")]));
        assert_eq!(config.memory_ceiling_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn test_override_memory_ceiling_ignores_garbage() {
        let mut config = EngineConfig::default();
        let before = config.memory_ceiling_bytes;
        apply_overrides_from(&mut config, lookup(&[(ENV_MEMORY_CEILING_MB, "plenty")]));
        assert_eq!(config.memory_ceiling_bytes, before);
    }

    #[test]
    fn test_override_endpoint() {
        let mut config = EngineConfig::default();
        apply_overrides_from(
            &mut config,
            lookup(&[(ENV_EMBED_ENDPOINT, "https://embed.example.com")]),
        );
        assert_eq!(
            config.embed_endpoint.as_deref(),
            Some("https://embed.example.com")
        );

        // Empty value disables the remote path.
        apply_overrides_from(&mut config, lookup(&[(ENV_EMBED_ENDPOINT, "")]));
        assert!(config.embed_endpoint.is_none());
    }

    #[test]
    fn test_no_vars_leave_config_untouched() {
        let mut config = EngineConfig::default();
        apply_overrides_from(&mut config, lookup(&[]));
        assert!(!config.keyword_only);
        assert!(config.embed_endpoint.is_none());
    }
}
