//! Shared types used by the vector store client and helpers.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors returned while interacting with the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store responded with an unexpected status code.
    #[error("Unexpected store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Origin category of an indexed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Structured knowledge-base article.
    Article,
    /// Chunk extracted from a paginated document.
    Pdf,
}

impl SourceKind {
    /// Tag stored in the `type` metadata field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Pdf => "pdf",
        }
    }
}

/// Metadata persisted alongside each indexed record.
#[derive(Debug, Clone, Default)]
pub struct RecordMetadata {
    /// Source article identifier, for article records.
    pub article_id: Option<String>,
    /// Application scope tag (`ana`, `self-care`, `hakki`, ...).
    pub app_name: Option<String>,
    /// Language of the embedded payload.
    pub language: String,
    /// Article title in the record's language, when known.
    pub title: Option<String>,
    /// Filesystem path of the source document, for chunk records.
    pub source_path: Option<String>,
    /// Ordinal of the chunk within its source document.
    pub chunk_ordinal: Option<u32>,
    /// First page covered by the chunk.
    pub page_start: Option<u32>,
    /// Last page covered by the chunk.
    pub page_end: Option<u32>,
    /// Free-form tags carried over from the source article.
    pub tags: Vec<String>,
}

/// One embedded document unit ready for upsert.
#[derive(Debug, Clone)]
pub struct IndexedRecord {
    /// Deterministic identifier derived from the record's identity tuple.
    pub record_id: Uuid,
    /// Source category recorded in the `type` metadata field.
    pub kind: SourceKind,
    /// Text payload that was embedded.
    pub text: String,
    /// Dense vector produced by the embedding model.
    pub embedding: Vec<f32>,
    /// Filterable metadata.
    pub metadata: RecordMetadata,
}

/// Conjunction of metadata equality predicates applied to queries.
#[derive(Debug, Default, Clone)]
pub struct QueryFilter {
    /// Exact match on the `language` metadata field.
    pub language: Option<String>,
    /// Exact match on the `app_name` metadata field.
    pub app_name: Option<String>,
    /// Exact match on the `type` metadata field (`article` | `pdf`).
    pub doc_type: Option<String>,
}

/// Scored payload returned by store queries, ordered by ascending distance.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// Identifier assigned to the vector.
    pub id: String,
    /// Engine-native distance; lower is better.
    pub distance: f32,
    /// Payload associated with the vector, when requested.
    pub payload: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) result: QueryResponseResult,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryResponseResult {
    Points(Vec<QueryPoint>),
    Object {
        #[serde(default)]
        points: Vec<QueryPoint>,
    },
}

#[derive(Deserialize)]
pub(crate) struct QueryPoint {
    pub(crate) id: Value,
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) payload: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct CountResponse {
    pub(crate) result: CountResult,
}

#[derive(Deserialize)]
pub(crate) struct CountResult {
    pub(crate) count: u64,
}
