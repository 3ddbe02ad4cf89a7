//! Lexical index build and rebuild
//!
//! The BM25 index lives in memory and covers the full chunk corpus. It
//! is built once at startup and rebuilt on demand after a corpus update
//! via POST /index/rebuild. The rebuild constructs a complete new index
//! before swapping it in, so in-flight queries never see a partial one.

use axum::{extract::State, Json};
use serde::Serialize;
use std::time::Instant;

use crate::AppState;
use rsge_common::errors::Result;
use rsge_common::Repository;
use rsge_search::{Bm25Index, Document};

/// Scan the whole chunk corpus in pages and build a BM25 index over it
pub async fn build_lexical_index(repo: &Repository, batch_size: u64) -> Result<Bm25Index> {
    let total = repo.count_chunks().await?;
    let mut documents: Vec<Document> = Vec::with_capacity(total as usize);

    let mut offset = 0;
    loop {
        let page = repo.all_chunks(offset, batch_size).await?;
        if page.is_empty() {
            break;
        }
        offset += page.len() as u64;
        documents.extend(page.into_iter().map(|hit| Document {
            id: hit.chunk_id,
            content: hit.content,
            case_number: hit.case_number,
        }));
    }

    Ok(Bm25Index::from_documents(documents))
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub chunks: usize,
    pub duration_ms: u64,
}

/// Rebuild the lexical index from the store and swap it in atomically
pub async fn rebuild(State(state): State<AppState>) -> Result<Json<RebuildResponse>> {
    let start = Instant::now();

    let index = build_lexical_index(&state.repo, state.config.retrieval.scan_batch_size).await?;
    let chunks = index.len();
    state.engine.swap_lexical(index).await;

    let duration_ms = start.elapsed().as_millis() as u64;
    tracing::info!(chunks, duration_ms, "Lexical index rebuilt");

    Ok(Json(RebuildResponse { chunks, duration_ms }))
}
