//! Translation service client.
//!
//! The client speaks the LibreTranslate wire shape (`POST /detect`,
//! `POST /translate`) against the endpoint named by `TRANSLATOR_API_URL`.
//! Translation is best-effort decoration: every failure, including an unset
//! endpoint, degrades to a no-op so answer generation is never blocked.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::get_config;

/// Errors raised by the translation service.
///
/// These never escape the client's public surface; they are logged and the
/// caller receives the no-op fallback instead.
#[derive(Debug, Error)]
enum TranslatorError {
    #[error("translator unreachable: {0}")]
    Unreachable(String),
    #[error("translator returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("malformed translator response: {0}")]
    InvalidResponse(String),
}

/// Result of a translation attempt.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// Translated text, or the input unchanged when translation was a no-op.
    pub text: String,
    /// Whether the service actually produced a translation.
    pub translated: bool,
}

/// Language detection and bidirectional translation with graceful fallback.
pub struct TranslatorClient {
    http: Client,
    base_url: Option<String>,
}

impl TranslatorClient {
    /// Construct a client against an explicit endpoint; `None` disables it.
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent(concat!("cora/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .expect("Failed to construct reqwest::Client for translation");
        Self { http, base_url }
    }

    /// Construct a client from the process configuration.
    pub fn from_config() -> Self {
        let config = get_config();
        Self::new(config.translator_api_url.clone(), config.translator_timeout)
    }

    /// Detect the language of the given text.
    ///
    /// Returns `None` when the service is unavailable or answers junk; the
    /// caller picks the fallback language.
    pub async fn detect(&self, text: &str) -> Option<String> {
        let base_url = self.base_url.as_ref()?;
        match self.detect_inner(base_url, text).await {
            Ok(language) => Some(language),
            Err(error) => {
                tracing::warn!(error = %error, "Language detection failed; falling back");
                None
            }
        }
    }

    /// Translate text between languages, falling back to the input on failure.
    pub async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        if source == target {
            return TranslationOutcome {
                text: text.to_string(),
                translated: false,
            };
        }
        let Some(base_url) = self.base_url.as_ref() else {
            return TranslationOutcome {
                text: text.to_string(),
                translated: false,
            };
        };

        match self.translate_inner(base_url, text, source, target).await {
            Ok(translated) => TranslationOutcome {
                text: translated,
                translated: true,
            },
            Err(error) => {
                tracing::warn!(
                    source,
                    target,
                    error = %error,
                    "Translation failed; returning input unchanged"
                );
                TranslationOutcome {
                    text: text.to_string(),
                    translated: false,
                }
            }
        }
    }

    async fn detect_inner(&self, base_url: &str, text: &str) -> Result<String, TranslatorError> {
        let response = self
            .http
            .post(endpoint(base_url, "detect"))
            .json(&json!({ "q": text }))
            .send()
            .await
            .map_err(|error| TranslatorError::Unreachable(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslatorError::UnexpectedStatus { status, body });
        }

        let candidates: Vec<DetectCandidate> = response
            .json()
            .await
            .map_err(|error| TranslatorError::InvalidResponse(error.to_string()))?;

        candidates
            .into_iter()
            .next()
            .map(|candidate| candidate.language)
            .filter(|language| !language.trim().is_empty())
            .ok_or_else(|| TranslatorError::InvalidResponse("empty detection list".into()))
    }

    async fn translate_inner(
        &self,
        base_url: &str,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslatorError> {
        let response = self
            .http
            .post(endpoint(base_url, "translate"))
            .json(&json!({
                "q": text,
                "source": source,
                "target": target,
                "format": "text",
            }))
            .send()
            .await
            .map_err(|error| TranslatorError::Unreachable(error.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslatorError::UnexpectedStatus { status, body });
        }

        let body: TranslateResponse = response
            .json()
            .await
            .map_err(|error| TranslatorError::InvalidResponse(error.to_string()))?;

        let translated = body.translated_text.trim();
        if translated.is_empty() {
            return Err(TranslatorError::InvalidResponse(
                "empty translation".into(),
            ));
        }
        Ok(translated.to_string())
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}

#[derive(Debug, Deserialize)]
struct DetectCandidate {
    language: String,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer) -> TranslatorClient {
        TranslatorClient::new(Some(server.base_url()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn detect_returns_the_top_candidate() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/detect");
                then.status(200).json_body(serde_json::json!([
                    { "language": "ar", "confidence": 92.0 },
                    { "language": "en", "confidence": 3.0 }
                ]));
            })
            .await;

        let detected = client_for(&server).detect("مرحبا").await;
        mock.assert();
        assert_eq!(detected.as_deref(), Some("ar"));
    }

    #[tokio::test]
    async fn detect_absorbs_service_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/detect");
                then.status(500).body("boom");
            })
            .await;

        assert!(client_for(&server).detect("hello").await.is_none());
    }

    #[tokio::test]
    async fn translate_returns_service_output() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/translate")
                    .json_body_partial(r#"{"source": "en", "target": "ar"}"#);
                then.status(200)
                    .json_body(serde_json::json!({ "translatedText": "مرحبا" }));
            })
            .await;

        let outcome = client_for(&server).translate("hello", "en", "ar").await;
        mock.assert();
        assert!(outcome.translated);
        assert_eq!(outcome.text, "مرحبا");
    }

    #[tokio::test]
    async fn translate_falls_back_to_input_on_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/translate");
                then.status(502).body("bad gateway");
            })
            .await;

        let outcome = client_for(&server).translate("hello", "en", "ar").await;
        assert!(!outcome.translated);
        assert_eq!(outcome.text, "hello");
    }

    #[tokio::test]
    async fn same_language_translation_is_a_no_op() {
        let client = TranslatorClient::new(None, Duration::from_secs(5));
        let outcome = client.translate("hello", "en", "en").await;
        assert!(!outcome.translated);
        assert_eq!(outcome.text, "hello");
    }

    #[tokio::test]
    async fn unset_endpoint_disables_the_client() {
        let client = TranslatorClient::new(None, Duration::from_secs(5));
        assert!(client.detect("hello").await.is_none());
        let outcome = client.translate("hello", "en", "ar").await;
        assert!(!outcome.translated);
    }
}
