use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cora::config;
use cora::embedding::get_embedding_client;
use cora::indexing::Indexer;
use cora::logging;
use cora::store::{StoreError, VectorStore};

#[derive(Parser)]
#[command(
    name = "index",
    about = "Index the knowledge base into the vector store"
)]
struct Cli {
    /// Root of the knowledge source tree (article JSON files and PDF documents).
    #[arg(long, default_value = "knowledge")]
    root: PathBuf,

    /// Destroy the collection, then reindex from scratch.
    #[arg(long)]
    reset: bool,

    /// Print the record count and store location without modifying anything.
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();

    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = Arc::new(VectorStore::from_config().context("failed to initialize vector store")?);

    if cli.stats {
        return print_stats(&store).await;
    }

    if cli.reset {
        store
            .reset()
            .await
            .context("failed to reset the collection")?;
        println!("Collection reset.");
    }

    let config = config::get_config();
    let indexer = Indexer::new(
        store.clone(),
        get_embedding_client(),
        config.chunk_size,
        config.chunk_overlap,
        config.upsert_batch_size,
    );

    let report = indexer
        .index_tree(&cli.root)
        .await
        .with_context(|| format!("indexing failed for {}", cli.root.display()))?;

    println!(
        "Indexed {} records ({} article variants, {} document chunks) from {} files.",
        report.records_upserted, report.article_records, report.chunk_records, report.files_seen
    );
    for error in &report.errors {
        eprintln!("skipped {}: {}", error.source, error.message);
    }
    if !report.errors.is_empty() {
        println!("{} item(s) skipped; see messages above.", report.errors.len());
    }

    let count = store.count().await.context("failed to read record count")?;
    println!("Store now holds {count} records at {}.", store.location());
    Ok(())
}

async fn print_stats(store: &VectorStore) -> Result<()> {
    // A missing collection reads as zero records rather than an error so
    // `--stats` stays side-effect free.
    let count = match store.count().await {
        Ok(count) => count,
        Err(StoreError::UnexpectedStatus { status, .. }) if status.as_u16() == 404 => 0,
        Err(error) => return Err(error).context("failed to read record count"),
    };
    println!("Records: {count}");
    println!("Store: {}", store.location());
    Ok(())
}
