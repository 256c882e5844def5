#![deny(missing_docs)]

//! Core library for the Cora support assistant.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Q&A and classification orchestration.
pub mod engine;
/// Knowledge-base ingestion pipeline.
pub mod indexing;
/// Supported language tags and helpers.
pub mod language;
/// Generative backend client.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Prompt templates for classification and Q&A.
pub mod prompt;
/// Semantic retrieval over the vector store.
pub mod retrieval;
/// In-memory conversation sessions.
pub mod session;
/// Qdrant vector store integration.
pub mod store;
/// Translation service client.
pub mod translate;
