//! Hybrid retrieval and reranking core
//!
//! Given a free-text question, selects the smallest set of passages most
//! likely to contain the answer:
//!
//! 1. Exact-match routing: a query naming a case number bypasses ranking
//!    and returns the full decision text.
//! 2. Dense retrieval (embedding nearest-neighbor) and sparse retrieval
//!    (BM25 over the in-memory lexical index) run concurrently.
//! 3. Candidates are merged and deduplicated by content.
//! 4. A cross-encoder scores every (query, candidate) pair in one batch.
//! 5. The top-K candidates become the answer context.

pub mod engine;
pub mod lexical;
pub mod merge;
pub mod router;
pub mod store;

pub use engine::RetrievalEngine;
pub use lexical::Bm25Index;
pub use router::{extract_case_number, CaseLookup};
pub use store::DocumentStore;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A retrievable passage. One row of the chunk corpus on the hybrid
/// path; the whole reassembled decision on the exact-match path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub content: String,
    pub case_number: Option<String>,
}

/// A document under consideration for the final context, tagged with
/// the retriever(s) that produced it. Lives for one retrieval call.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub document: Document,
    pub origin_dense: bool,
    pub origin_sparse: bool,
}

/// A candidate with its reranker score
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f32,
}

/// How a retrieval call produced its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    /// The query named a stored case number
    Exact,
    /// Dense + sparse retrieval with reranking
    Hybrid,
}

impl RetrievalStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStrategy::Exact => "exact",
            RetrievalStrategy::Hybrid => "hybrid",
        }
    }
}

/// The ordered context returned to the caller. An empty `documents`
/// sequence means no relevant context was found; it is not a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    pub documents: Vec<Document>,
    pub strategy: RetrievalStrategy,
}

impl Retrieval {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Knobs of one retrieval engine instance
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Nearest-neighbor candidates fetched by the dense retriever
    pub dense_limit: usize,

    /// Candidates fetched by the BM25 sparse retriever. Wider than the
    /// dense net: lexical recall compensates for vocabulary mismatch on
    /// exact legal terms.
    pub sparse_limit: usize,

    /// Final context size on the hybrid path. The exact path is
    /// unbounded: the whole matched decision comes back.
    pub top_k: usize,

    /// Per-branch deadline for the dense and sparse retrievers
    pub retriever_timeout: Duration,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            dense_limit: 50,
            sparse_limit: 60,
            top_k: 10,
            retriever_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&rsge_common::config::RetrievalSettings> for RetrievalConfig {
    fn from(settings: &rsge_common::config::RetrievalSettings) -> Self {
        Self {
            dense_limit: settings.dense_limit,
            sparse_limit: settings.sparse_limit,
            top_k: settings.top_k,
            retriever_timeout: Duration::from_millis(settings.retriever_timeout_ms),
        }
    }
}
