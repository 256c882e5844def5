//! Semantic retrieval over the vector store.
//!
//! Distances reported by the engine are normalized to a similarity in (0, 1]
//! via `1 / (1 + distance)`. With that mapping a barely relevant hit lands
//! around 0.25 and a strong match around 0.5, which is why the default
//! threshold sits at 0.3.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::store::{QueryFilter, ScoredRecord, StoreError, VectorStore};

/// Default number of hits returned by retrieval.
pub const DEFAULT_K: usize = 3;
/// Default similarity threshold applied to hits.
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Errors emitted while orchestrating similarity searches.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Embedding provider failed to return vectors for the query text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// The vector store rejected the query.
    #[error("Store request failed: {0}")]
    Store(#[from] StoreError),
    /// Embedding provider returned no vectors.
    #[error("Embedding provider returned no vectors for the query")]
    EmptyEmbedding,
}

/// Metadata projected out of a hit payload.
#[derive(Debug, Clone, Default)]
pub struct HitMetadata {
    /// Source category (`article` | `pdf`).
    pub doc_type: String,
    /// Source article identifier, when the hit is an article.
    pub article_id: Option<String>,
    /// Application scope tag.
    pub app_name: Option<String>,
    /// Language of the stored payload.
    pub language: Option<String>,
    /// Article title, when stored.
    pub title: Option<String>,
    /// Source document path, when the hit is a chunk.
    pub source_path: Option<String>,
    /// Chunk ordinal, when the hit is a chunk.
    pub chunk_ordinal: Option<u32>,
}

/// A query result with normalized similarity.
#[derive(Debug, Clone)]
pub struct Hit {
    /// Identifier of the indexed record.
    pub record_id: String,
    /// Stored text payload.
    pub text: String,
    /// Projected metadata.
    pub metadata: HitMetadata,
    /// Engine-native distance; lower is better.
    pub distance: f32,
    /// Normalized similarity in (0, 1]; higher is better.
    pub similarity: f32,
}

/// Translates natural-language queries into ranked, filtered, normalized hits.
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingClient + Send + Sync>,
}

impl Retriever {
    /// Build a retriever over explicit store and embedding handles.
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn EmbeddingClient + Send + Sync>) -> Self {
        Self { store, embedder }
    }

    /// Retrieve up to `k` hits above `threshold`, best first.
    ///
    /// The raw store query always asks for at least three candidates so a
    /// small `k` does not starve the threshold filter.
    pub async fn retrieve(
        &self,
        query_text: &str,
        k: usize,
        filter: &QueryFilter,
        threshold: f32,
    ) -> Result<Vec<Hit>, RetrievalError> {
        let mut vectors = self
            .embedder
            .generate_embeddings(vec![query_text.to_string()])
            .await?;
        let vector = vectors.pop().ok_or(RetrievalError::EmptyEmbedding)?;

        let k_raw = k.max(DEFAULT_K);
        let records = self.store.query(vector, k_raw, filter).await?;
        tracing::debug!(
            query_chars = query_text.chars().count(),
            raw_hits = records.len(),
            k,
            threshold,
            "Retrieval query complete"
        );

        Ok(rank_hits(
            records.into_iter().map(map_scored_record).collect(),
            k,
            threshold,
        ))
    }

    /// Retrieve hits and render the context block used by prompt assembly.
    pub async fn retrieve_and_format(
        &self,
        query_text: &str,
        k: usize,
        filter: &QueryFilter,
        threshold: f32,
    ) -> Result<(Vec<Hit>, String), RetrievalError> {
        let hits = self.retrieve(query_text, k, filter, threshold).await?;
        let block = format_context_block(&hits);
        Ok((hits, block))
    }

    /// Project ranked hits onto unique article identifiers.
    pub async fn article_recommendations(
        &self,
        query_text: &str,
        k: usize,
        filter: &QueryFilter,
    ) -> Result<Vec<String>, RetrievalError> {
        let hits = self
            .retrieve(query_text, k, filter, DEFAULT_THRESHOLD)
            .await?;
        let mut seen = std::collections::HashSet::new();
        Ok(hits
            .into_iter()
            .filter(|hit| hit.metadata.doc_type == "article")
            .filter_map(|hit| hit.metadata.article_id)
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }
}

/// Normalize an engine distance into the (0, 1] similarity range.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance.max(0.0))
}

/// Threshold, order, and truncate hits.
///
/// Ordering is descending similarity with ascending `record_id` as a stable
/// tie-break, so retrieval at a lower threshold always returns a superset of
/// retrieval at a higher one.
fn rank_hits(mut hits: Vec<Hit>, k: usize, threshold: f32) -> Vec<Hit> {
    hits.retain(|hit| hit.similarity >= threshold);
    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.record_id.cmp(&b.record_id))
    });
    hits.truncate(k);
    hits
}

/// Render the `[Source N]` context block consumed by the prompt assembler.
pub fn format_context_block(hits: &[Hit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(idx, hit)| {
            let mut header = format!("[Source {}] [type={}]", idx + 1, hit.metadata.doc_type);
            if let Some(article_id) = &hit.metadata.article_id {
                header.push_str(&format!(" [article_id={article_id}]"));
            }
            if let Some(source_path) = &hit.metadata.source_path {
                header.push_str(&format!(" [source={source_path}]"));
            }
            header.push_str(&format!(" [similarity={:.2}]", hit.similarity));
            format!("{header}\n{}", hit.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn map_scored_record(record: ScoredRecord) -> Hit {
    let ScoredRecord {
        id,
        distance,
        payload,
    } = record;

    let mut text = String::new();
    let mut metadata = HitMetadata::default();

    if let Some(mut map) = payload {
        if let Some(Value::String(value)) = map.remove("text") {
            text = value;
        }
        if let Some(Value::String(value)) = map.remove("type") {
            metadata.doc_type = value;
        }
        if let Some(Value::String(value)) = map.remove("article_id") {
            metadata.article_id = Some(value);
        }
        if let Some(Value::String(value)) = map.remove("app_name") {
            metadata.app_name = Some(value);
        }
        if let Some(Value::String(value)) = map.remove("language") {
            metadata.language = Some(value);
        }
        if let Some(Value::String(value)) = map.remove("title") {
            metadata.title = Some(value);
        }
        if let Some(Value::String(value)) = map.remove("source_path") {
            metadata.source_path = Some(value);
        }
        if let Some(value) = map.remove("chunk_ordinal") {
            metadata.chunk_ordinal = value.as_u64().and_then(|v| u32::try_from(v).ok());
        }
    }

    Hit {
        record_id: id,
        text,
        metadata,
        distance,
        similarity: similarity_from_distance(distance),
    }
}
