//! Deterministic record identity and payload construction.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::types::{IndexedRecord, SourceKind};

/// Derive the record identifier from its identity tuple.
///
/// The id is the first half of the SHA-256 digest of
/// `(source_kind, source_id, language, chunk_ordinal)` rendered as a UUID, so the
/// same source re-indexed always lands on the same point and upsert stays
/// idempotent.
pub fn record_id(kind: SourceKind, source_id: &str, language: &str, chunk_ordinal: u32) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0x1f]);
    hasher.update(source_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(language.as_bytes());
    hasher.update([0x1f]);
    hasher.update(chunk_ordinal.to_be_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

/// Build the payload object stored alongside each indexed record.
pub(crate) fn build_payload(record: &IndexedRecord) -> Value {
    let mut payload = Map::new();
    payload.insert("type".into(), Value::String(record.kind.as_str().into()));
    payload.insert(
        "language".into(),
        Value::String(record.metadata.language.clone()),
    );
    payload.insert("text".into(), Value::String(record.text.clone()));

    if let Some(article_id) = record
        .metadata
        .article_id
        .as_ref()
        .filter(|value| !value.is_empty())
    {
        payload.insert("article_id".into(), Value::String(article_id.clone()));
    }
    if let Some(app_name) = record
        .metadata
        .app_name
        .as_ref()
        .filter(|value| !value.is_empty())
    {
        payload.insert("app_name".into(), Value::String(app_name.clone()));
    }
    if let Some(title) = record
        .metadata
        .title
        .as_ref()
        .filter(|value| !value.is_empty())
    {
        payload.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(source_path) = record
        .metadata
        .source_path
        .as_ref()
        .filter(|value| !value.is_empty())
    {
        payload.insert("source_path".into(), Value::String(source_path.clone()));
    }
    if let Some(ordinal) = record.metadata.chunk_ordinal {
        payload.insert("chunk_ordinal".into(), Value::from(ordinal));
    }
    if let Some(page_start) = record.metadata.page_start {
        payload.insert("page_start".into(), Value::from(page_start));
    }
    if let Some(page_end) = record.metadata.page_end {
        payload.insert("page_end".into(), Value::from(page_end));
    }
    if !record.metadata.tags.is_empty() {
        payload.insert(
            "tags".into(),
            Value::Array(
                record
                    .metadata
                    .tags
                    .iter()
                    .map(|tag| Value::String(tag.clone()))
                    .collect(),
            ),
        );
    }

    Value::Object(payload)
}
