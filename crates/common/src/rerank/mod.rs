//! Pairwise relevance scorer abstraction
//!
//! The reranking pass scores every (query, passage) pair with a
//! cross-encoder. Scoring is the dominant cost of a retrieval call, so
//! the whole candidate batch goes out in a single request. A scorer
//! that errors, or returns a score count different from the passage
//! count, fails the current call; the pipeline never silently falls
//! back to unranked order.
//!
//! The default provider is a text-embeddings-inference server hosting
//! `cross-encoder/ms-marco-MiniLM-L-6-v2` behind its `/rerank` endpoint.

use crate::config::RerankerConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Trait for pairwise (query, passage) relevance scoring
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Score each passage against the query, in a single batched call.
    /// Returns one score per passage, in input order.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Client for a TEI `/rerank` endpoint
pub struct TeiScorer {
    client: reqwest::Client,
    api_base: String,
    model: String,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
}

#[derive(Deserialize)]
struct RerankItem {
    index: usize,
    score: f32,
}

impl TeiScorer {
    /// Create a new scorer from configuration
    pub fn new(config: &RerankerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Scorer for TeiScorer {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/rerank", self.api_base);

        let request = RerankRequest {
            query,
            texts: passages,
            raw_scores: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::RerankerError {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RerankerError {
                message: format!("API error {}: {}", status, body),
            });
        }

        // The endpoint returns items ordered by score; map them back
        // to input order via the index field.
        let items: Vec<RerankItem> =
            response.json().await.map_err(|e| AppError::RerankerError {
                message: format!("Failed to parse response: {}", e),
            })?;

        let mut scores = vec![None; passages.len()];
        for item in items {
            match scores.get_mut(item.index) {
                Some(slot) => *slot = Some(item.score),
                None => {
                    return Err(AppError::RerankerError {
                        message: format!("Score index {} out of range", item.index),
                    })
                }
            }
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| AppError::RerankerError {
                    message: format!("Missing score for passage {}", i),
                })
            })
            .collect()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Keyword-overlap scorer for tests. Deterministic: the score is the
/// fraction of query terms present in the passage.
pub struct MockScorer;

#[async_trait]
impl Scorer for MockScorer {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let query_terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();

        Ok(passages
            .iter()
            .map(|p| {
                if query_terms.is_empty() {
                    return 0.0;
                }
                let lowered = p.to_lowercase();
                let matches = query_terms.iter().filter(|t| lowered.contains(*t)).count();
                matches as f32 / query_terms.len() as f32
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "mock-scorer"
    }
}

/// Create a scorer based on configuration
pub fn create_scorer(config: &RerankerConfig) -> Result<Arc<dyn Scorer>> {
    match config.provider.as_str() {
        "tei" => Ok(Arc::new(TeiScorer::new(config)?)),
        "mock" => Ok(Arc::new(MockScorer)),
        other => Err(AppError::Configuration {
            message: format!("Unknown reranker provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scorer_overlap() {
        let scorer = MockScorer;
        let passages = vec![
            "the quick brown fox".to_string(),
            "a lazy dog".to_string(),
        ];
        let scores = scorer.score("quick fox", &passages).await.unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_mock_scorer_empty_batch() {
        let scorer = MockScorer;
        let scores = scorer.score("query", &[]).await.unwrap();
        assert!(scores.is_empty());
    }
}
