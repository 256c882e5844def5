//! Generative backend client.
//!
//! The Ollama adapter issues HTTP requests directly to the runtime, mirroring
//! the embedding adapter. Two modes are exposed: one-shot strict-JSON
//! generation (with a single retry on parse failure) and token streaming over
//! Ollama's newline-delimited chunk protocol. Dropping a token stream drops
//! the underlying connection, so caller cancellation propagates naturally.

use std::pin::Pin;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::get_config;

/// Errors raised by the generative backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Backend could not be reached or the connection dropped mid-stream.
    #[error("LLM backend unreachable: {0}")]
    Unreachable(String),
    /// Backend answered with an unexpected status code.
    #[error("LLM backend returned {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status from the backend.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Backend response could not be decoded.
    #[error("Malformed LLM response: {0}")]
    InvalidResponse(String),
    /// Strict-JSON generation failed to produce parseable JSON after a retry.
    #[error("LLM produced invalid JSON after retry: {0}")]
    InvalidJson(String),
}

/// Sampling options passed to the backend.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Model override; falls back to the client default when `None`.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Deterministic seed, when reproducibility matters.
    pub seed: Option<i64>,
    /// Token budget for the response.
    pub num_predict: Option<u32>,
}

impl GenerationOptions {
    /// Preset used for ticket classification: low temperature, pinned seed.
    pub fn classification() -> Self {
        Self {
            model: None,
            temperature: 0.4,
            top_p: 0.15,
            seed: Some(42),
            num_predict: Some(256),
        }
    }

    /// Preset used for conversational answers.
    pub fn conversational() -> Self {
        Self {
            model: None,
            temperature: 0.3,
            top_p: 0.85,
            seed: None,
            num_predict: Some(400),
        }
    }

    fn to_options_json(&self) -> Value {
        let mut options = json!({
            "temperature": self.temperature,
            "top_p": self.top_p,
        });
        let obj = options
            .as_object_mut()
            .expect("options body should remain an object");
        if let Some(seed) = self.seed {
            obj.insert("seed".into(), Value::from(seed));
        }
        if let Some(num_predict) = self.num_predict {
            obj.insert("num_predict".into(), Value::from(num_predict));
        }
        options
    }
}

/// Finite, non-restartable sequence of token chunks.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Interface implemented by generative backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One-shot strict-JSON generation with a single retry on parse failure.
    async fn generate_json(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Value, LlmError>;

    /// Stream token chunks until the model's stop condition.
    async fn stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TokenStream, LlmError>;
}

/// Client for the Ollama `/api/generate` endpoint.
pub struct OllamaClient {
    http: Client,
    base_url: String,
    default_model: String,
}

impl OllamaClient {
    /// Construct a client against an explicit endpoint and default model.
    pub fn new(base_url: String, default_model: String) -> Self {
        let http = Client::builder()
            .user_agent(concat!("cora/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to construct reqwest::Client for generation");
        Self {
            http,
            base_url,
            default_model,
        }
    }

    /// Construct a client from the process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(config.ollama_host.clone(), config.model_name.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn model_for<'a>(&'a self, options: &'a GenerationOptions) -> &'a str {
        options.model.as_deref().unwrap_or(&self.default_model)
    }

    async fn generate_once(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let payload = json!({
            "model": self.model_for(options),
            "prompt": prompt,
            "stream": false,
            "format": "json",
            "options": options.to_options_json(),
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                LlmError::Unreachable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::UnexpectedStatus { status, body });
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            LlmError::InvalidResponse(format!("failed to decode generate response: {error}"))
        })?;

        if !body.done {
            return Err(LlmError::InvalidResponse(
                "generate response incomplete".into(),
            ));
        }

        Ok(body.response)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate_json(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Value, LlmError> {
        let mut last_error = String::new();
        for attempt in 0..2 {
            let text = self.generate_once(prompt, options).await?;
            match serde_json::from_str::<Value>(text.trim()) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    last_error = error.to_string();
                    tracing::warn!(
                        attempt,
                        error = %error,
                        "Model output was not valid JSON"
                    );
                }
            }
        }
        Err(LlmError::InvalidJson(last_error))
    }

    async fn stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<TokenStream, LlmError> {
        let payload = json!({
            "model": self.model_for(options),
            "prompt": prompt,
            "stream": true,
            "options": options.to_options_json(),
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                LlmError::Unreachable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::UnexpectedStatus { status, body });
        }

        let mut bytes = response.bytes_stream();
        let stream = try_stream! {
            let mut buffer: Vec<u8> = Vec::new();
            'outer: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|error| {
                    LlmError::Unreachable(format!("stream interrupted: {error}"))
                })?;
                buffer.extend_from_slice(&chunk);

                while let Some(newline) = buffer.iter().position(|byte| *byte == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    let parsed = parse_stream_line(&line[..newline])?;
                    let Some(parsed) = parsed else { continue };
                    if !parsed.response.is_empty() {
                        yield parsed.response;
                    }
                    if parsed.done {
                        break 'outer;
                    }
                }
            }

            // A final chunk without a trailing newline still carries tokens.
            if let Some(parsed) = parse_stream_line(&buffer)? {
                if !parsed.response.is_empty() {
                    yield parsed.response;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn parse_stream_line(line: &[u8]) -> Result<Option<StreamChunk>, LlmError> {
    let trimmed: Vec<u8> = line
        .iter()
        .copied()
        .filter(|byte| *byte != b'\r')
        .collect();
    if trimmed.iter().all(|byte| byte.is_ascii_whitespace()) {
        return Ok(None);
    }
    serde_json::from_slice::<StreamChunk>(&trimmed)
        .map(Some)
        .map_err(|error| LlmError::InvalidResponse(format!("bad stream chunk: {error}")))
}
