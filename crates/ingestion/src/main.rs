//! RS.ge RAG Ingestion CLI
//!
//! One-shot run over a directory of scraped decision JSON files:
//! parse, chunk, embed, store. Re-running is safe: already-stored
//! documents are skipped by source id.

mod chunker;
mod processor;
mod source;

use processor::Processor;
use rsge_common::{config::AppConfig, db::DbPool, embeddings, metrics, Repository, VERSION};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting RS.ge RAG ingestion v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    metrics::register_metrics();

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);

    // The same model the query path embeds with
    let embedder = embeddings::create_embedder(&config.embedding)?;
    info!(model = embedder.model_name(), "Embedder ready");

    let processor = Processor::new(repo, embedder, config.ingestion.clone());
    let stats = processor.run().await?;

    if stats.failed > 0 {
        tracing::warn!(failed = stats.failed, "Some files failed to ingest");
    }

    Ok(())
}
