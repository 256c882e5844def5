//! Embedding client abstraction and adapters.
//!
//! The Ollama adapter is the production path; the deterministic hashing client
//! exists for offline runs and tests, where a real model is unavailable but the
//! pipeline still needs stable vectors.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::get_config;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce an embedding vector for each supplied text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Embedding client backed by the Ollama `/api/embed` endpoint.
pub struct OllamaEmbeddingClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingClient {
    /// Construct a client against an explicit Ollama endpoint and model.
    pub fn new(base_url: String, model: String) -> Self {
        let http = Client::builder()
            .user_agent(concat!("cora/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to construct reqwest::Client for embeddings");
        Self {
            http,
            base_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embed", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        let requested = texts.len();
        tracing::debug!(model = %self.model, texts = requested, "Generating embeddings");

        let payload = json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::GenerationFailed(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: EmbedResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::GenerationFailed(format!(
                "failed to decode embed response: {error}"
            ))
        })?;

        if body.embeddings.len() != requested {
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "expected {requested} embeddings, got {}",
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }
}

/// Deterministic fallback embedding client.
///
/// Hashes content bytes into a fixed-dimension normalized vector. Not a
/// semantic embedding; only the indexing and retrieval plumbing can be
/// exercised with it.
pub struct HashEmbeddingClient {
    dimension: usize,
}

impl HashEmbeddingClient {
    /// Construct a hashing client producing vectors of the given dimension.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];

        if text.is_empty() || self.dimension == 0 {
            return embedding;
        }

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % self.dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        if texts.is_empty() {
            return Err(EmbeddingClientError::GenerationFailed(
                "no texts provided".to_string(),
            ));
        }

        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }
}

/// Build the embedding client configured for this process.
pub fn get_embedding_client() -> Arc<dyn EmbeddingClient + Send + Sync> {
    let config = get_config();
    Arc::new(OllamaEmbeddingClient::new(
        config.ollama_host.clone(),
        config.embedding_model.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn ollama_client_sends_batch_input() {
        let server = MockServer::start_async().await;
        let client = OllamaEmbeddingClient {
            http: Client::builder()
                .user_agent("cora-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            model: "nomic-embed-text".into(),
        };

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/embed")
                    .json_body_partial(r#"{"model": "nomic-embed-text"}"#);
                then.status(200).json_body(serde_json::json!({
                    "embeddings": [[0.1, 0.2], [0.3, 0.4]]
                }));
            })
            .await;

        let embeddings = client
            .generate_embeddings(vec!["alpha".into(), "beta".into()])
            .await
            .expect("embeddings");

        mock.assert();
        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], vec![0.1, 0.2]);
    }

    #[tokio::test]
    async fn ollama_client_rejects_count_mismatch() {
        let server = MockServer::start_async().await;
        let client = OllamaEmbeddingClient {
            http: Client::builder()
                .user_agent("cora-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            model: "nomic-embed-text".into(),
        };

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embed");
                then.status(200)
                    .json_body(serde_json::json!({ "embeddings": [[0.1]] }));
            })
            .await;

        let error = client
            .generate_embeddings(vec!["alpha".into(), "beta".into()])
            .await
            .expect_err("mismatch");
        assert!(error.to_string().contains("expected 2 embeddings"));
    }

    #[tokio::test]
    async fn hash_client_is_deterministic_and_normalized() {
        let client = HashEmbeddingClient::new(8);
        let first = client
            .generate_embeddings(vec!["signal".into()])
            .await
            .expect("embeddings");
        let second = client
            .generate_embeddings(vec!["signal".into()])
            .await
            .expect("embeddings");

        assert_eq!(first, second);
        let norm: f32 = first[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn hash_client_rejects_empty_input() {
        let client = HashEmbeddingClient::new(8);
        assert!(client.generate_embeddings(Vec::new()).await.is_err());
    }
}
