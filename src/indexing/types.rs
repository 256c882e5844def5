//! Core data types and error definitions for the ingestion pipeline.

use thiserror::Error;

/// Errors produced while splitting document text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Ingestion configured an impossible chunk budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap leaves no forward progress between chunks.
    #[error("chunk overlap {overlap} must be smaller than chunk size {chunk_size}")]
    OverlapTooLarge {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured chunk size in characters.
        chunk_size: usize,
    },
}

/// Errors emitted while extracting text from a paginated document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document could not be opened or parsed.
    #[error("failed to load document: {0}")]
    Load(#[from] lopdf::Error),
    /// The document produced no extractable text.
    #[error("document contains no extractable text")]
    Empty,
}

/// Unrecoverable errors emitted by an indexing run.
///
/// Per-item parse failures are not represented here; they are collected in
/// [`IndexReport::errors`] and the run continues.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Chunking configuration was rejected.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] crate::embedding::EmbeddingClientError),
    /// The vector store rejected a call.
    #[error("Store request failed: {0}")]
    Store(#[from] crate::store::StoreError),
}

/// One skipped source item with the reason it was skipped.
#[derive(Debug, Clone)]
pub struct IndexItemError {
    /// Path (and element position, where applicable) of the failing item.
    pub source: String,
    /// Human-readable cause.
    pub message: String,
}

/// Summary of a completed indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Source files visited.
    pub files_seen: usize,
    /// Article-language variants indexed.
    pub article_records: usize,
    /// Document chunks indexed.
    pub chunk_records: usize,
    /// Records submitted to the store.
    pub records_upserted: usize,
    /// Items skipped due to parse failures.
    pub errors: Vec<IndexItemError>,
}
