//! Raw retrieval handler
//!
//! Exposes the retrieval core without the generation step, for
//! exploration and debugging of ranking quality.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use rsge_common::errors::{AppError, Result};
use rsge_search::RetrievalStrategy;

/// Search request
#[derive(Debug, Deserialize, Validate)]
pub struct SearchRequest {
    #[validate(length(min = 1, max = 4000))]
    pub query: String,

    /// Optional tighter context size; never widens the configured K
    pub top_k: Option<usize>,
}

/// Search response
#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub strategy: RetrievalStrategy,
    pub total_results: usize,
    pub results: Vec<SearchResultItem>,
    pub processing_time_ms: u64,
}

#[derive(Serialize)]
pub struct SearchResultItem {
    pub id: Uuid,
    pub case_number: Option<String>,
    pub content: String,
}

/// Retrieve the answer context for a query
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let start = Instant::now();

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("query".to_string()),
    })?;

    let mut retrieval = state.engine.retrieve(&request.query).await?;

    if let Some(top_k) = request.top_k {
        retrieval.documents.truncate(top_k);
    }

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        query = %request.query,
        strategy = retrieval.strategy.as_str(),
        results = retrieval.documents.len(),
        latency_ms = processing_time_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse {
        query: request.query,
        strategy: retrieval.strategy,
        total_results: retrieval.documents.len(),
        results: retrieval
            .documents
            .into_iter()
            .map(|d| SearchResultItem {
                id: d.id,
                case_number: d.case_number,
                content: d.content,
            })
            .collect(),
        processing_time_ms,
    }))
}
