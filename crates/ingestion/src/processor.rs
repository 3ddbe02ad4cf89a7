//! Ingestion processor
//!
//! Walks the scraped data directory, parses and chunks each decision,
//! embeds the chunks and writes everything to the document store. A bad
//! file is logged and skipped; the run continues.

use crate::chunker::{chunk_text, ChunkingConfig};
use crate::source::parse_decision;
use futures::stream::{self, StreamExt};
use rsge_common::config::IngestionConfig;
use rsge_common::errors::Result;
use rsge_common::{metrics, Embedder, Repository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one file
enum FileOutcome {
    Ingested { chunks: usize },
    AlreadyStored,
    Empty,
}

/// Totals for a whole ingestion run
#[derive(Debug, Default)]
pub struct IngestStats {
    pub files: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub failed: usize,
    pub chunks: usize,
}

pub struct Processor {
    repo: Repository,
    embedder: Arc<dyn Embedder>,
    config: IngestionConfig,
    chunking: ChunkingConfig,
}

impl Processor {
    pub fn new(repo: Repository, embedder: Arc<dyn Embedder>, config: IngestionConfig) -> Self {
        let chunking = ChunkingConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        };
        Self {
            repo,
            embedder,
            config,
            chunking,
        }
    }

    /// Process every JSON file in the data directory
    pub async fn run(&self) -> Result<IngestStats> {
        let files = self.list_files()?;
        info!(files = files.len(), dir = %self.config.data_dir, "Starting ingestion");

        let mut stats = IngestStats {
            files: files.len(),
            ..IngestStats::default()
        };

        let mut outcomes = stream::iter(files)
            .map(|path| async move {
                let outcome = self.process_file(&path).await;
                (path, outcome)
            })
            .buffer_unordered(self.config.file_concurrency.max(1));

        while let Some((path, outcome)) = outcomes.next().await {
            match outcome {
                Ok(FileOutcome::Ingested { chunks }) => {
                    stats.ingested += 1;
                    stats.chunks += chunks;
                }
                Ok(FileOutcome::AlreadyStored) | Ok(FileOutcome::Empty) => stats.skipped += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to ingest file");
                    stats.failed += 1;
                }
            }
        }

        info!(
            ingested = stats.ingested,
            skipped = stats.skipped,
            failed = stats.failed,
            chunks = stats.chunks,
            "Ingestion complete"
        );

        Ok(stats)
    }

    fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.config.data_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }

    async fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let raw = tokio::fs::read_to_string(path).await?;

        let Some(decision) = parse_decision(&raw)? else {
            return Ok(FileOutcome::Empty);
        };

        if self
            .repo
            .find_decision_by_source_id(&decision.source_id)
            .await?
            .is_some()
        {
            return Ok(FileOutcome::AlreadyStored);
        }

        let chunks = chunk_text(&decision.content, &self.chunking)?;
        if chunks.is_empty() {
            return Ok(FileOutcome::Empty);
        }

        let embed_started = Instant::now();
        let embeddings = match self.embedder.embed_batch(&chunks).await {
            Ok(embeddings) => {
                metrics::record_embedding(
                    embed_started.elapsed().as_secs_f64(),
                    self.embedder.model_name(),
                    true,
                );
                embeddings
            }
            Err(e) => {
                metrics::record_embedding(
                    embed_started.elapsed().as_secs_f64(),
                    self.embedder.model_name(),
                    false,
                );
                return Err(e);
            }
        };

        let chunk_count = chunks.len();
        let rows = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (content, embedding))| (index as i32, content, embedding))
            .collect();

        self.repo
            .store_decision(
                decision.source_id.clone(),
                decision.title,
                decision.case_number.clone(),
                decision.kind,
                self.embedder.model_name(),
                rows,
            )
            .await?;

        metrics::record_ingestion(chunk_count);
        info!(
            source_id = %decision.source_id,
            case_number = decision.case_number.as_deref().unwrap_or("-"),
            chunks = chunk_count,
            "Decision stored"
        );

        Ok(FileOutcome::Ingested {
            chunks: chunk_count,
        })
    }
}
