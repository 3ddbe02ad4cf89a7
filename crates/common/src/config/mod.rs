//! Configuration management for the RS.ge RAG services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/<env>.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Reranker service configuration
    #[serde(default)]
    pub reranker: RerankerConfig,

    /// Generation model configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Retrieval pipeline configuration
    #[serde(default)]
    pub retrieval: RetrievalSettings,

    /// Ingestion configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: tei, mock
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API base URL of the embedding server
    #[serde(default = "default_embedding_base")]
    pub api_base: String,

    /// API key, if the endpoint requires one
    pub api_key: Option<String>,

    /// Model served at the endpoint; must match the ingestion-time model
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_model_retries")]
    pub max_retries: u32,

    /// Batch size for embedding requests
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RerankerConfig {
    /// Reranker provider: tei, mock
    #[serde(default = "default_reranker_provider")]
    pub provider: String,

    /// API base URL of the reranker server
    #[serde(default = "default_reranker_base")]
    pub api_base: String,

    /// Cross-encoder model served at the endpoint
    #[serde(default = "default_reranker_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Generation provider: gemini, mock
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    /// API base URL
    #[serde(default = "default_generation_base")]
    pub api_base: String,

    /// API key for the generation service
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

/// Knobs of the retrieval pipeline. The dense and sparse limits are
/// independently tunable: lexical ranking casts a wider net to catch
/// exact legal-term matches the embedding model may miss.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalSettings {
    /// Nearest-neighbor candidates fetched by the dense retriever
    #[serde(default = "default_dense_limit")]
    pub dense_limit: usize,

    /// Candidates fetched by the BM25 sparse retriever
    #[serde(default = "default_sparse_limit")]
    pub sparse_limit: usize,

    /// Final context size returned to the caller
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Per-branch deadline for the dense and sparse retrievers
    #[serde(default = "default_retriever_timeout_ms")]
    pub retriever_timeout_ms: u64,

    /// Batch size when scanning the corpus to build the lexical index
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestionConfig {
    /// Directory of scraped decision JSON files
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Files processed concurrently
    #[serde(default = "default_file_concurrency")]
    pub file_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_rate_limit_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_request_timeout() -> u64 {
    60
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    300
}
fn default_embedding_provider() -> String {
    "tei".to_string()
}
fn default_embedding_base() -> String {
    "http://localhost:8081/v1".to_string()
}
fn default_embedding_model() -> String {
    crate::DEFAULT_EMBEDDING_MODEL.to_string()
}
fn default_embedding_dimension() -> usize {
    crate::DEFAULT_EMBEDDING_DIMENSION
}
fn default_model_timeout() -> u64 {
    30
}
fn default_model_retries() -> u32 {
    3
}
fn default_embedding_batch_size() -> usize {
    32
}
fn default_reranker_provider() -> String {
    "tei".to_string()
}
fn default_reranker_base() -> String {
    "http://localhost:8082".to_string()
}
fn default_reranker_model() -> String {
    "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string()
}
fn default_generation_provider() -> String {
    "gemini".to_string()
}
fn default_generation_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_dense_limit() -> usize {
    50
}
fn default_sparse_limit() -> usize {
    60
}
fn default_top_k() -> usize {
    10
}
fn default_retriever_timeout_ms() -> u64 {
    5000
}
fn default_scan_batch_size() -> u64 {
    5000
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_chunk_size() -> usize {
    2000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_file_concurrency() -> usize {
    4
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_json_logging() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9090
}
fn default_service_name() -> String {
    "rsge-rag".to_string()
}
fn default_rate_limit() -> u32 {
    20
}
fn default_burst() -> u32 {
    40
}
fn default_rate_limit_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_base: default_embedding_base(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_model_timeout(),
            max_retries: default_model_retries(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            provider: default_reranker_provider(),
            api_base: default_reranker_base(),
            model: default_reranker_model(),
            timeout_secs: default_model_timeout(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            api_base: default_generation_base(),
            api_key: None,
            model: default_generation_model(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            dense_limit: default_dense_limit(),
            sparse_limit: default_sparse_limit(),
            top_k: default_top_k(),
            retriever_timeout_ms: default_retriever_timeout_ms(),
            scan_batch_size: default_scan_batch_size(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            file_concurrency: default_file_concurrency(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_rate_limit_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8001
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Per-branch retriever deadline as Duration
    pub fn retriever_timeout(&self) -> Duration {
        Duration::from_millis(self.retrieval.retriever_timeout_ms)
    }

    /// Get the read database URL (falls back to primary)
    pub fn read_database_url(&self) -> &str {
        self.database
            .read_url
            .as_deref()
            .unwrap_or(&self.database.url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/rsge_rag".to_string(),
                read_url: None,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            embedding: EmbeddingConfig::default(),
            reranker: RerankerConfig::default(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalSettings::default(),
            ingestion: IngestionConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.embedding.model, "intfloat/multilingual-e5-small");
        assert_eq!(config.retrieval.dense_limit, 50);
        assert_eq!(config.retrieval.sparse_limit, 60);
        assert_eq!(config.retrieval.top_k, 10);
    }

    #[test]
    fn test_read_database_fallback() {
        let config = AppConfig::default();
        assert_eq!(config.read_database_url(), "postgres://localhost/rsge_rag");
    }

    #[test]
    fn test_retriever_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.retriever_timeout(), Duration::from_millis(5000));
    }
}
