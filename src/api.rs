//! HTTP surface for Cora.
//!
//! A compact Axum router with the public endpoints:
//!
//! - `POST /ask` – Answer a customer question; responds with the full
//!   `AnswerResult` including sources, confidence, and session id.
//! - `POST /ask/stream` – Same request, answered as a newline-delimited JSON
//!   stream of `{"chunk": ...}` events terminated by one `{"final": ...}`.
//! - `POST /classify` – Classify a support ticket into a routing decision.
//! - `GET /health` – Liveness probe with the crate version.
//! - `GET /` – Self-description enumerating the endpoints.
//!
//! Customers never see raw backend errors: failures either degrade inside the
//! engine to safe fallback answers or map to opaque 500/504 responses here.

use crate::engine::{AskRequest, EngineError, StreamEvent, SupportApi};
use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

/// Build the HTTP router exposing the support API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SupportApi + 'static,
{
    Router::new()
        .route("/", get(describe))
        .route("/health", get(health))
        .route("/ask", post(ask::<S>))
        .route("/ask/stream", post(ask_stream::<S>))
        .route("/classify", post(classify::<S>))
        .with_state(service)
}

/// Answer a customer question in one shot.
async fn ask<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Result<Response, AppError>
where
    S: SupportApi,
{
    let result = service.ask(request).await?;
    tracing::info!(
        session_id = %result.session_id,
        confidence = ?result.confidence,
        retrieved = result.retrieved_docs,
        "Ask request completed"
    );
    Ok(Json(result).into_response())
}

/// Answer a customer question as an NDJSON chunk stream.
async fn ask_stream<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Response
where
    S: SupportApi,
{
    let events = service.ask_stream(request).await;
    let body = events.map(|event| Ok::<_, Infallible>(encode_event(&event)));

    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(body))
        .unwrap_or_else(|error| {
            tracing::error!(error = %error, "Failed to build stream response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

fn encode_event(event: &StreamEvent) -> Vec<u8> {
    let mut line = serde_json::to_vec(event).unwrap_or_else(|error| {
        tracing::error!(error = %error, "Failed to encode stream event");
        b"{}".to_vec()
    });
    line.push(b'\n');
    line
}

/// Request body for the `POST /classify` endpoint.
#[derive(Deserialize)]
struct ClassifyRequest {
    /// Raw ticket text.
    text: String,
}

/// Classify a support ticket.
async fn classify<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Response, AppError>
where
    S: SupportApi,
{
    let result = service.classify(&request.text).await?;
    Ok(Json(result).into_response())
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Descriptor for a single endpoint in the discovery catalog.
#[derive(Serialize)]
struct EndpointDescriptor {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /`.
#[derive(Serialize)]
struct DescribeResponse {
    service: &'static str,
    version: &'static str,
    endpoints: Vec<EndpointDescriptor>,
}

/// Enumerate the HTTP surface for discovery.
async fn describe() -> Json<DescribeResponse> {
    Json(DescribeResponse {
        service: "cora",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointDescriptor {
                method: "POST",
                path: "/ask",
                description: "Answer a customer question; body { question, language?, app_name?, session_id? }.",
            },
            EndpointDescriptor {
                method: "POST",
                path: "/ask/stream",
                description: "Same as /ask but responds with newline-delimited JSON chunk events and a final payload.",
            },
            EndpointDescriptor {
                method: "POST",
                path: "/classify",
                description: "Classify a support ticket; body { text }.",
            },
            EndpointDescriptor {
                method: "GET",
                path: "/health",
                description: "Liveness probe.",
            },
        ],
    })
}

struct AppError(EngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            EngineError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "request timed out"),
            EngineError::Llm(_) => (StatusCode::INTERNAL_SERVER_ERROR, "generation failed"),
            EngineError::Validation(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "classification failed")
            }
        };
        tracing::error!(error = %self.0, "Request failed");
        (status, message).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(inner: EngineError) -> Self {
        Self(inner)
    }
}
