//! RS.ge RAG Common Library
//!
//! Shared code for the gateway and ingestion binaries:
//! - Document store (SeaORM entities, repository, pgvector queries)
//! - Embedding, reranker and generation clients
//! - Error types and handling
//! - Configuration management
//! - Metrics helpers

pub mod config;
pub mod db;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod metrics;
pub mod rerank;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{ChunkHit, Repository};
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use generation::Generator;
pub use rerank::Scorer;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model, must match the model used at ingestion time
pub const DEFAULT_EMBEDDING_MODEL: &str = "intfloat/multilingual-e5-small";

/// Default embedding dimension (multilingual-e5-small)
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
