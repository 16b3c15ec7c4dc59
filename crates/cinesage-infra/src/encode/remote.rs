//! Remote embedding-service encoder.
//!
//! Implements the `TextEncoder` trait against a batch `/embed` endpoint
//! (`{"texts": [...]}` in, `{"embeddings": [[...]]}` out). A hosted
//! model that is still loading answers 503 (or an error body saying so);
//! that case is retried with exponential backoff for a bounded number of
//! attempts. Every other failure is terminal for this backend -- the
//! arbitration layer then falls back to local encoding.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cinesage_core::encoder::TextEncoder;
use cinesage_types::error::EncodeError;

/// First retry delay; doubles after every warming-up answer.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Error payload shape used by hosted inference endpoints.
#[derive(Deserialize)]
struct RemoteErrorBody {
    error: Option<String>,
}

/// Batch text encoder backed by an external embedding service.
pub struct RemoteEncoder {
    client: reqwest::Client,
    base_url: String,
    model_name: String,
    dimension: usize,
    max_retries: u32,
}

impl RemoteEncoder {
    /// Create a new remote encoder.
    ///
    /// `dimension` must match the hosted model's output width; the
    /// retrieval engine rejects mismatched vectors before they can
    /// corrupt a ranking.
    pub fn new(
        base_url: impl Into<String>,
        model_name: impl Into<String>,
        dimension: usize,
        timeout: Duration,
        max_retries: u32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create reqwest client");

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            model_name: model_name.into(),
            dimension,
            max_retries,
        }
    }

    fn url(&self) -> String {
        format!("{}/embed", self.base_url)
    }

    async fn request_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
        let response = self
            .client
            .post(self.url())
            .json(&EmbedRequest { texts })
            .send()
            .await
            .map_err(|e| EncodeError::Remote {
                status: 0,
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.as_u16() == 503 {
            return Err(EncodeError::WarmingUp);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_warming_up(&body) {
                return Err(EncodeError::WarmingUp);
            }
            return Err(EncodeError::Remote {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| EncodeError::Remote {
            status: status.as_u16(),
            message: format!("failed to parse response: {e}"),
        })?;
        Ok(parsed.embeddings)
    }
}

/// Whether an error body is the hosted platform's "model is loading"
/// answer, which is retryable unlike a real failure.
fn is_warming_up(body: &str) -> bool {
    serde_json::from_str::<RemoteErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .is_some_and(|msg| {
            let msg = msg.to_lowercase();
            msg.contains("loading") || msg.contains("warming up")
        })
}

impl TextEncoder for RemoteEncoder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
        let mut delay = INITIAL_BACKOFF;
        let mut attempt = 0_u32;
        loop {
            match self.request_once(texts).await {
                Err(EncodeError::WarmingUp) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "remote model warming up, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                result => return result,
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_strips_trailing_slash() {
        let encoder = RemoteEncoder::new(
            "https://embeddings.example.com/",
            "all-MiniLM-L6-v2",
            384,
            Duration::from_secs(5),
            3,
        );
        assert_eq!(encoder.url(), "https://embeddings.example.com/embed");
    }

    #[test]
    fn test_is_warming_up_detects_loading_body() {
        let body = r#"{"error": "Model sentence-transformers/all-MiniLM-L6-v2 is currently loading", "estimated_time": 20.0}"#;
        assert!(is_warming_up(body));
    }

    #[test]
    fn test_is_warming_up_ignores_other_errors() {
        assert!(!is_warming_up(r#"{"error": "Authorization header is invalid"}"#));
        assert!(!is_warming_up(r#"{"detail": "not found"}"#));
        assert!(!is_warming_up("<html>bad gateway</html>"));
        assert!(!is_warming_up(""));
    }

    #[test]
    fn test_reported_model_and_dimension() {
        let encoder = RemoteEncoder::new(
            "http://localhost:7860",
            "all-MiniLM-L6-v2",
            384,
            Duration::from_secs(5),
            3,
        );
        assert_eq!(encoder.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(encoder.dimension(), 384);
    }
}
