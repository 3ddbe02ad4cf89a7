//! Text chunking module
//!
//! Splits decision text into overlapping chunks for embedding. The
//! chunk geometry must stay fixed across the corpus: retrieval quality
//! degrades if differently-sized chunks mix in one index.

use rsge_common::errors::{AppError, Result};
use text_splitter::{ChunkConfig, TextSplitter};
use tracing::debug;

/// Configuration for text chunking
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

/// Split text into chunks for embedding
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    let chunk_config = ChunkConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map_err(|e| AppError::Configuration {
            message: format!("Invalid chunking config: {}", e),
        })?;

    let splitter = TextSplitter::new(chunk_config);
    let chunks: Vec<String> = splitter.chunks(text).map(|c| c.to_string()).collect();

    debug!(
        input_len = text.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Text chunked"
    );

    Ok(chunks)
}
