//! Qdrant vector store integration.

pub mod client;
pub mod filters;
pub mod payload;
pub mod types;

pub use client::VectorStore;
pub use filters::build_query_filter;
pub use payload::record_id;
pub use types::{IndexedRecord, QueryFilter, RecordMetadata, ScoredRecord, SourceKind, StoreError};
