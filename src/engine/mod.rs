//! Q&A and classification orchestration.

pub mod classify;
pub mod qa;

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use thiserror::Error;

pub use classify::{ClassificationResult, validate_classification};
pub use qa::{
    AnswerResult, AskRequest, Confidence, EngineSettings, SourceRef, StreamEvent, SupportEngine,
};

use crate::llm::LlmError;

/// Errors surfaced by the orchestration layer.
///
/// Retrieval and translation failures never appear here; they degrade inside
/// the pipeline. What remains maps directly onto HTTP statuses.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The generative backend failed.
    #[error("Generation failed: {0}")]
    Llm(#[from] LlmError),
    /// Classifier output failed schema validation after a retry.
    #[error("Classification output failed validation: {0}")]
    Validation(String),
    /// A per-request deadline was breached.
    #[error("{operation} timed out")]
    Timeout {
        /// Operation that breached its ceiling.
        operation: &'static str,
    },
}

/// Finite stream of Q&A events: zero or more chunks, then one final payload.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Abstraction over the engine used by the HTTP surface.
#[async_trait]
pub trait SupportApi: Send + Sync {
    /// Answer a customer question in one shot.
    async fn ask(&self, request: AskRequest) -> Result<AnswerResult, EngineError>;

    /// Answer a customer question as a chunk stream terminated by a final payload.
    ///
    /// Failures inside the stream surface as a fallback final event rather
    /// than an error; the response status is already committed by then.
    async fn ask_stream(&self, request: AskRequest) -> EventStream;

    /// Classify a support ticket into a routing decision.
    async fn classify(&self, text: &str) -> Result<ClassificationResult, EngineError>;
}
