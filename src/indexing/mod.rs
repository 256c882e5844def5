//! Knowledge-base ingestion pipeline.
//!
//! The indexer walks a source tree holding two kinds of material: structured
//! multilingual articles (JSON) and long paginated documents (PDF). Both are
//! turned into [`crate::store::IndexedRecord`]s and committed in batches
//! through the vector store, with per-item failures collected rather than
//! aborting the run.

pub mod articles;
pub mod chunking;
pub mod documents;
pub mod service;
pub mod types;

pub use articles::{Article, parse_article_file};
pub use service::Indexer;
pub use types::{IndexError, IndexItemError, IndexReport};
