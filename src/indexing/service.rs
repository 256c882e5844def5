//! Indexing service coordinating parsing, chunking, embedding, and store writes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::embedding::EmbeddingClient;
use crate::store::{IndexedRecord, RecordMetadata, SourceKind, VectorStore, record_id};

use super::articles::parse_article_file;
use super::chunking::chunk_pages;
use super::documents::extract_pages;
use super::types::{IndexError, IndexItemError, IndexReport};

/// Coordinates the full ingestion pipeline over a source tree.
///
/// The service owns long-lived handles to the embedding client and the vector
/// store so the CLI constructs everything once. Record identities are
/// deterministic, so running the same tree twice leaves the collection count
/// unchanged.
pub struct Indexer {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingClient + Send + Sync>,
    chunk_size: usize,
    chunk_overlap: usize,
    batch_size: usize,
}

/// A record awaiting its embedding.
struct PendingRecord {
    kind: SourceKind,
    source_id: String,
    language: String,
    chunk_ordinal: u32,
    text: String,
    metadata: RecordMetadata,
}

impl Indexer {
    /// Build an indexer over explicit components and chunking knobs.
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingClient + Send + Sync>,
        chunk_size: usize,
        chunk_overlap: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            chunk_size,
            chunk_overlap,
            batch_size: batch_size.max(1),
        }
    }

    /// Walk the source tree and upsert every article variant and document chunk.
    ///
    /// Enumeration is sorted so batch composition is deterministic. Parse
    /// failures are collected into the report; only store and embedding
    /// failures abort the run.
    pub async fn index_tree(&self, root: &Path) -> Result<IndexReport, IndexError> {
        self.store.ensure_collection().await?;

        let mut report = IndexReport::default();
        let mut pending: Vec<PendingRecord> = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
        {
            let path = entry.path();
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);

            match extension.as_deref() {
                Some("json") => {
                    report.files_seen += 1;
                    self.collect_articles(root, path, &mut pending, &mut report);
                }
                Some("pdf") => {
                    report.files_seen += 1;
                    self.collect_chunks(root, path, &mut pending, &mut report)?;
                }
                _ => continue,
            }

            while pending.len() >= self.batch_size {
                let batch: Vec<PendingRecord> = pending.drain(..self.batch_size).collect();
                report.records_upserted += self.flush(batch).await?;
            }
        }

        if !pending.is_empty() {
            report.records_upserted += self.flush(pending).await?;
        }

        tracing::info!(
            root = %root.display(),
            files = report.files_seen,
            article_records = report.article_records,
            chunk_records = report.chunk_records,
            upserted = report.records_upserted,
            skipped = report.errors.len(),
            "Indexing run complete"
        );
        Ok(report)
    }

    fn collect_articles(
        &self,
        root: &Path,
        path: &Path,
        pending: &mut Vec<PendingRecord>,
        report: &mut IndexReport,
    ) {
        let source = relative_source(root, path);
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) => {
                report.errors.push(IndexItemError {
                    source,
                    message: error.to_string(),
                });
                return;
            }
        };

        let (articles, item_errors) = match parse_article_file(&source, &contents) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(source = %source, error = %error, "Skipping unparseable article file");
                report.errors.push(IndexItemError {
                    source,
                    message: error.to_string(),
                });
                return;
            }
        };
        report.errors.extend(item_errors);

        for article in articles {
            for variant in article.language_variants() {
                pending.push(PendingRecord {
                    kind: SourceKind::Article,
                    source_id: article.article_id.clone(),
                    language: variant.language.to_string(),
                    chunk_ordinal: 0,
                    text: variant.payload,
                    metadata: RecordMetadata {
                        article_id: Some(article.article_id.clone()),
                        app_name: non_empty(&article.app_name),
                        language: variant.language.to_string(),
                        title: non_empty(&variant.title),
                        tags: article.tags.clone(),
                        ..Default::default()
                    },
                });
                report.article_records += 1;
            }
        }
    }

    fn collect_chunks(
        &self,
        root: &Path,
        path: &Path,
        pending: &mut Vec<PendingRecord>,
        report: &mut IndexReport,
    ) -> Result<(), IndexError> {
        let source = relative_source(root, path);
        let pages = match extract_pages(path) {
            Ok(pages) => pages,
            Err(error) => {
                tracing::warn!(source = %source, error = %error, "Skipping unreadable document");
                report.errors.push(IndexItemError {
                    source,
                    message: error.to_string(),
                });
                return Ok(());
            }
        };

        let chunks = chunk_pages(&pages, self.chunk_size, self.chunk_overlap)?;
        for chunk in chunks {
            pending.push(PendingRecord {
                kind: SourceKind::Pdf,
                source_id: source.clone(),
                language: "unknown".to_string(),
                chunk_ordinal: chunk.ordinal,
                text: chunk.text,
                metadata: RecordMetadata {
                    language: "unknown".to_string(),
                    source_path: Some(source.clone()),
                    chunk_ordinal: Some(chunk.ordinal),
                    page_start: Some(chunk.page_start),
                    page_end: Some(chunk.page_end),
                    ..Default::default()
                },
            });
            report.chunk_records += 1;
        }

        Ok(())
    }

    async fn flush(&self, batch: Vec<PendingRecord>) -> Result<usize, IndexError> {
        let texts: Vec<String> = batch.iter().map(|record| record.text.clone()).collect();
        let embeddings = self.embedder.generate_embeddings(texts).await?;

        debug_assert_eq!(batch.len(), embeddings.len());

        let records: Vec<IndexedRecord> = batch
            .into_iter()
            .zip(embeddings.into_iter())
            .map(|(pending, embedding)| IndexedRecord {
                record_id: record_id(
                    pending.kind,
                    &pending.source_id,
                    &pending.language,
                    pending.chunk_ordinal,
                ),
                kind: pending.kind,
                text: pending.text,
                embedding,
                metadata: pending.metadata,
            })
            .collect();

        Ok(self.store.upsert(&records).await?)
    }
}

fn relative_source(root: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingClient;
    use httpmock::{Method::GET, Method::PUT, MockServer};
    use serde_json::json;

    fn mock_store(server: &MockServer, batch_size: usize) -> Arc<VectorStore> {
        Arc::new(VectorStore {
            client: reqwest::Client::builder()
                .user_agent("cora-test")
                .build()
                .expect("client"),
            base_url: server.base_url(),
            api_key: None,
            collection: "kb".into(),
            vector_size: 8,
            batch_size,
        })
    }

    fn mock_collection_endpoints(server: &MockServer) {
        server.mock(|when, then| {
            when.method(GET).path("/collections/kb");
            then.status(200).json_body(json!({ "status": "ok", "result": {} }));
        });
    }

    fn article_json() -> String {
        json!([
            {
                "article_id": "17",
                "app_name": "ana",
                "title": { "en": "Reset password", "ar": "إعادة تعيين" },
                "body": { "en": "Open settings.", "ar": "افتح الإعدادات." }
            },
            {
                "article_id": "18",
                "app_name": "self-care",
                "title": { "en": "No signal" },
                "body": { "en": "Restart the phone." }
            }
        ])
        .to_string()
    }

    #[tokio::test]
    async fn index_tree_emits_one_record_per_language_variant() {
        let server = MockServer::start_async().await;
        mock_collection_endpoints(&server);
        let upsert = server.mock(|when, then| {
            when.method(PUT).path("/collections/kb/points");
            then.status(200).json_body(json!({ "status": "ok", "result": {} }));
        });

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("kb.json"), article_json()).expect("write");

        let indexer = Indexer::new(
            mock_store(&server, 64),
            Arc::new(HashEmbeddingClient::new(8)),
            1000,
            150,
            64,
        );
        let report = indexer.index_tree(dir.path()).await.expect("report");

        assert_eq!(report.files_seen, 1);
        // Article 17 carries en+ar, article 18 carries en only.
        assert_eq!(report.article_records, 3);
        assert_eq!(report.records_upserted, 3);
        assert!(report.errors.is_empty());
        upsert.assert_hits(1);
    }

    #[tokio::test]
    async fn malformed_articles_do_not_abort_the_run() {
        let server = MockServer::start_async().await;
        mock_collection_endpoints(&server);
        server.mock(|when, then| {
            when.method(PUT).path("/collections/kb/points");
            then.status(200).json_body(json!({ "status": "ok", "result": {} }));
        });

        let dir = tempfile::tempdir().expect("tempdir");
        let contents = json!([
            { "article_id": "1", "title": { "en": "Good" }, "body": { "en": "Body" } },
            { "title": { "en": "No id" } }
        ])
        .to_string();
        std::fs::write(dir.path().join("kb.json"), contents).expect("write");
        std::fs::write(dir.path().join("junk.json"), "not json").expect("write");

        let indexer = Indexer::new(
            mock_store(&server, 64),
            Arc::new(HashEmbeddingClient::new(8)),
            1000,
            150,
            64,
        );
        let report = indexer.index_tree(dir.path()).await.expect("report");

        assert_eq!(report.article_records, 1);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().any(|e| e.source == "kb.json#1"));
        assert!(report.errors.iter().any(|e| e.source == "junk.json"));
    }

    #[tokio::test]
    async fn batches_flush_at_the_configured_size() {
        let server = MockServer::start_async().await;
        mock_collection_endpoints(&server);
        let upsert = server.mock(|when, then| {
            when.method(PUT).path("/collections/kb/points");
            then.status(200).json_body(json!({ "status": "ok", "result": {} }));
        });

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("kb.json"), article_json()).expect("write");

        // Batch size 2 over 3 records: one full flush plus the tail flush.
        let indexer = Indexer::new(
            mock_store(&server, 2),
            Arc::new(HashEmbeddingClient::new(8)),
            1000,
            150,
            2,
        );
        let report = indexer.index_tree(dir.path()).await.expect("report");

        assert_eq!(report.records_upserted, 3);
        upsert.assert_hits(2);
    }

    #[tokio::test]
    async fn store_failure_aborts_with_an_error() {
        let server = MockServer::start_async().await;
        mock_collection_endpoints(&server);
        server.mock(|when, then| {
            when.method(PUT).path("/collections/kb/points");
            then.status(500).body("boom");
        });

        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("kb.json"), article_json()).expect("write");

        let indexer = Indexer::new(
            mock_store(&server, 64),
            Arc::new(HashEmbeddingClient::new(8)),
            1000,
            150,
            64,
        );
        let error = indexer.index_tree(dir.path()).await.expect_err("store error");
        assert!(matches!(error, IndexError::Store(_)));
    }
}
