//! Retrieval engine
//!
//! Owns the process-wide retrieval handles (document store, lexical
//! index, embedder, scorer) and orchestrates one `retrieve` call:
//! exact-match routing, concurrent dense/sparse fan-out, merging,
//! reranking, top-K selection. All handles are read-only at query time;
//! concurrent calls share them freely. Failures are call-scoped and
//! never touch shared state.

use crate::merge::merge_candidates;
use crate::router::{extract_case_number, CaseLookup};
use crate::store::DocumentStore;
use crate::{
    Bm25Index, Candidate, Document, Retrieval, RetrievalConfig, RetrievalStrategy, ScoredCandidate,
};
use rsge_common::errors::{AppError, Result};
use rsge_common::{metrics, Embedder, Scorer};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub struct RetrievalEngine {
    store: Arc<dyn DocumentStore>,
    /// Swapped whole on rebuild; readers see old or new, never partial
    lexical: RwLock<Arc<Bm25Index>>,
    embedder: Arc<dyn Embedder>,
    scorer: Arc<dyn Scorer>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Construct an engine over already-initialized handles
    pub fn new(
        store: Arc<dyn DocumentStore>,
        lexical: Bm25Index,
        embedder: Arc<dyn Embedder>,
        scorer: Arc<dyn Scorer>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            lexical: RwLock::new(Arc::new(lexical)),
            embedder,
            scorer,
            config,
        }
    }

    /// Replace the lexical index atomically. In-flight queries finish
    /// against the index they already hold.
    pub async fn swap_lexical(&self, index: Bm25Index) {
        let chunks = index.len();
        *self.lexical.write().await = Arc::new(index);
        metrics::record_lexical_index_size(chunks);
        info!(chunks, "Lexical index swapped");
    }

    /// Number of chunks in the current lexical index
    pub async fn lexical_len(&self) -> usize {
        self.lexical.read().await.len()
    }

    /// Retrieve the answer context for a question. An empty result
    /// means no relevant context exists; it is not a failure.
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        let started = Instant::now();

        if let Some(case_number) = extract_case_number(query) {
            match self.lookup_case(&case_number).await? {
                CaseLookup::Hit(chunks) => {
                    let document = reassemble_decision(case_number, chunks);
                    info!(
                        case_number = document.case_number.as_deref().unwrap_or(""),
                        latency_ms = started.elapsed().as_millis() as u64,
                        "Exact-match hit, ranking bypassed"
                    );
                    metrics::record_retrieval(
                        started.elapsed().as_secs_f64(),
                        RetrievalStrategy::Exact.as_str(),
                        0,
                        1,
                    );
                    return Ok(Retrieval {
                        documents: vec![document],
                        strategy: RetrievalStrategy::Exact,
                    });
                }
                CaseLookup::Miss => {
                    debug!(
                        case_number = %case_number,
                        "Recognized number matches nothing in the store, using hybrid path"
                    );
                }
            }
        }

        let (dense, sparse) = self.gather(query).await?;
        let candidates = merge_candidates(dense, sparse);
        let candidate_count = candidates.len();

        if candidates.is_empty() {
            info!("Both retrievers came back empty, no context found");
            metrics::record_retrieval(
                started.elapsed().as_secs_f64(),
                RetrievalStrategy::Hybrid.as_str(),
                0,
                0,
            );
            return Ok(Retrieval {
                documents: Vec::new(),
                strategy: RetrievalStrategy::Hybrid,
            });
        }

        let ranked = self.rerank(query, candidates).await?;

        let documents: Vec<Document> = ranked
            .into_iter()
            .take(self.config.top_k)
            .map(|scored| scored.candidate.document)
            .collect();

        info!(
            candidates = candidate_count,
            results = documents.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Hybrid retrieval complete"
        );
        metrics::record_retrieval(
            started.elapsed().as_secs_f64(),
            RetrievalStrategy::Hybrid.as_str(),
            candidate_count,
            documents.len(),
        );

        Ok(Retrieval {
            documents,
            strategy: RetrievalStrategy::Hybrid,
        })
    }

    /// Store lookup behind the exact-match router
    async fn lookup_case(&self, case_number: &str) -> Result<CaseLookup> {
        let chunks = self.store.by_case_number(case_number).await?;
        if chunks.is_empty() {
            Ok(CaseLookup::Miss)
        } else {
            Ok(CaseLookup::Hit(chunks))
        }
    }

    /// Run both retrievers concurrently, each under its own deadline.
    /// One timed-out branch degrades to the other branch's hits; both
    /// timing out fails the call.
    async fn gather(&self, query: &str) -> Result<(Vec<Document>, Vec<Document>)> {
        let deadline = self.config.retriever_timeout;

        let (dense, sparse) = tokio::join!(
            timeout(deadline, self.dense_hits(query)),
            timeout(deadline, self.sparse_hits(query)),
        );

        let dense = branch_hits("dense", dense)?;
        let sparse = branch_hits("sparse", sparse)?;

        if dense.is_none() && sparse.is_none() {
            return Err(AppError::RetrievalTimeout {
                timeout_ms: deadline.as_millis() as u64,
            });
        }

        Ok((dense.unwrap_or_default(), sparse.unwrap_or_default()))
    }

    async fn dense_hits(&self, query: &str) -> Result<Vec<Document>> {
        let embedding = self.embedder.embed(query).await?;
        self.store.nearest(&embedding, self.config.dense_limit).await
    }

    async fn sparse_hits(&self, query: &str) -> Result<Vec<Document>> {
        let index = self.lexical.read().await.clone();
        Ok(index.rank(query, self.config.sparse_limit))
    }

    /// Score the whole candidate batch in one call and sort descending.
    /// The sort is stable, so equal scores keep merge order.
    async fn rerank(&self, query: &str, candidates: Vec<Candidate>) -> Result<Vec<ScoredCandidate>> {
        let passages: Vec<String> = candidates
            .iter()
            .map(|candidate| candidate.document.content.clone())
            .collect();

        let scores = self.scorer.score(query, &passages).await?;

        if scores.len() != candidates.len() {
            return Err(AppError::RerankerError {
                message: format!(
                    "scorer returned {} scores for {} candidates",
                    scores.len(),
                    candidates.len()
                ),
            });
        }

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, score)| ScoredCandidate { candidate, score })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(scored)
    }
}

/// Interpret one retriever branch: hits pass through, a deadline miss
/// degrades to `None`, anything else fails the call.
fn branch_hits(
    branch: &'static str,
    outcome: std::result::Result<Result<Vec<Document>>, tokio::time::error::Elapsed>,
) -> Result<Option<Vec<Document>>> {
    match outcome {
        Ok(Ok(hits)) => Ok(Some(hits)),
        // An embedding client timeout is a deadline miss, not a failure
        Ok(Err(AppError::EmbeddingTimeout { .. })) | Err(_) => {
            warn!(branch, "Retriever exceeded its deadline, proceeding without it");
            Ok(None)
        }
        Ok(Err(e)) => Err(e),
    }
}

/// The exact path returns the whole decision as one synthetic document:
/// its chunks concatenated in document order under the matched number.
fn reassemble_decision(case_number: String, chunks: Vec<Document>) -> Document {
    let id = chunks[0].id;
    let content = chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    Document {
        id,
        content,
        case_number: Some(case_number),
    }
}
