//! Retrieval engine behavior against in-memory collaborators

use async_trait::async_trait;
use rsge_common::embeddings::MockEmbedder;
use rsge_common::errors::{AppError, Result};
use rsge_common::Scorer;
use rsge_search::{
    Bm25Index, Document, DocumentStore, Retrieval, RetrievalConfig, RetrievalEngine,
    RetrievalStrategy,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn doc(content: &str) -> Document {
    Document {
        id: Uuid::new_v4(),
        content: content.to_string(),
        case_number: None,
    }
}

fn case_chunk(case_number: &str, decision_id: Uuid, content: &str) -> Document {
    Document {
        id: decision_id,
        content: content.to_string(),
        case_number: Some(case_number.to_string()),
    }
}

#[derive(Default)]
struct FakeStore {
    cases: HashMap<String, Vec<Document>>,
    nearest: Vec<Document>,
    nearest_delay: Option<Duration>,
    fail_nearest: bool,
}

#[async_trait]
impl DocumentStore for FakeStore {
    async fn by_case_number(&self, case_number: &str) -> Result<Vec<Document>> {
        Ok(self.cases.get(case_number).cloned().unwrap_or_default())
    }

    async fn nearest(&self, _embedding: &[f32], limit: usize) -> Result<Vec<Document>> {
        if let Some(delay) = self.nearest_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_nearest {
            return Err(AppError::DatabaseConnection {
                message: "store offline".to_string(),
            });
        }
        Ok(self.nearest.iter().take(limit).cloned().collect())
    }
}

/// Scores passages from a lookup table (default 0.5) and counts calls
struct TableScorer {
    calls: AtomicUsize,
    table: HashMap<String, f32>,
}

impl TableScorer {
    fn new(entries: &[(&str, f32)]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            table: entries
                .iter()
                .map(|(content, score)| (content.to_string(), *score))
                .collect(),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scorer for TableScorer {
    async fn score(&self, _query: &str, passages: &[String]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(passages
            .iter()
            .map(|p| self.table.get(p).copied().unwrap_or(0.5))
            .collect())
    }

    fn model_name(&self) -> &str {
        "table-scorer"
    }
}

struct FailingScorer;

#[async_trait]
impl Scorer for FailingScorer {
    async fn score(&self, _query: &str, _passages: &[String]) -> Result<Vec<f32>> {
        Err(AppError::RerankerError {
            message: "scorer offline".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "failing-scorer"
    }
}

/// Always returns a single score regardless of batch size
struct MalformedScorer;

#[async_trait]
impl Scorer for MalformedScorer {
    async fn score(&self, _query: &str, _passages: &[String]) -> Result<Vec<f32>> {
        Ok(vec![0.0])
    }

    fn model_name(&self) -> &str {
        "malformed-scorer"
    }
}

fn engine(
    store: FakeStore,
    sparse_corpus: Vec<Document>,
    scorer: Arc<dyn Scorer>,
    config: RetrievalConfig,
) -> RetrievalEngine {
    RetrievalEngine::new(
        Arc::new(store),
        Bm25Index::from_documents(sparse_corpus),
        Arc::new(MockEmbedder::new(8)),
        scorer,
        config,
    )
}

fn contents(retrieval: &Retrieval) -> Vec<&str> {
    retrieval
        .documents
        .iter()
        .map(|d| d.content.as_str())
        .collect()
}

#[tokio::test]
async fn exact_match_bypasses_ranking() {
    let decision_id = Uuid::new_v4();
    let mut store = FakeStore::default();
    store.cases.insert(
        "4521".to_string(),
        vec![
            case_chunk("4521", decision_id, "პირველი ნაწილი"),
            case_chunk("4521", decision_id, "მეორე ნაწილი"),
        ],
    );
    // Junk in both indexes proves the exact path ignores them
    store.nearest = vec![doc("irrelevant dense hit")];
    let sparse_corpus = vec![doc("irrelevant sparse hit")];

    let scorer = TableScorer::new(&[]);
    let engine = engine(
        store,
        sparse_corpus,
        scorer.clone(),
        RetrievalConfig::default(),
    );

    let result = engine
        .retrieve("რა გადაწყვეტილება იქნა მიღებული საქმეზე 4521?")
        .await
        .unwrap();

    assert_eq!(result.strategy, RetrievalStrategy::Exact);
    assert_eq!(result.documents.len(), 1);
    assert_eq!(result.documents[0].content, "პირველი ნაწილი\n\nმეორე ნაწილი");
    assert_eq!(result.documents[0].case_number.as_deref(), Some("4521"));
    assert_eq!(result.documents[0].id, decision_id);
    assert_eq!(scorer.call_count(), 0, "reranker must not run on the exact path");
}

#[tokio::test]
async fn unmatched_case_number_falls_through_to_hybrid() {
    let mut store = FakeStore::default();
    store.nearest = vec![doc("tax assessment annulled")];

    let scorer = TableScorer::new(&[]);
    let engine = engine(store, vec![], scorer.clone(), RetrievalConfig::default());

    // 9999 looks like a case number but nothing is filed under it
    let result = engine.retrieve("penalty in case 9999").await.unwrap();

    assert_eq!(result.strategy, RetrievalStrategy::Hybrid);
    assert_eq!(contents(&result), vec!["tax assessment annulled"]);
    assert_eq!(scorer.call_count(), 1);
}

#[tokio::test]
async fn merger_dedups_and_ties_keep_merge_order() {
    let mut store = FakeStore::default();
    store.nearest = vec![
        doc("tax assessment annulled"),
        doc("penalty waived tribunal"),
        doc("customs declaration dispute"),
    ];
    // Shares one content with the dense set; BM25 matches both corpus
    // docs on the query terms
    let sparse_corpus = vec![
        doc("penalty waived tribunal"),
        doc("income tax recalculated"),
    ];

    let scorer = TableScorer::new(&[]);
    let engine = engine(store, sparse_corpus, scorer.clone(), RetrievalConfig::default());

    let result = engine.retrieve("penalty tax").await.unwrap();

    // All scores equal: the stable sort preserves merge order,
    // dense before sparse, with the shared hit appearing once
    assert_eq!(
        contents(&result),
        vec![
            "tax assessment annulled",
            "penalty waived tribunal",
            "customs declaration dispute",
            "income tax recalculated",
        ]
    );
    assert_eq!(scorer.call_count(), 1);
}

#[tokio::test]
async fn reranker_orders_by_score() {
    let mut store = FakeStore::default();
    store.nearest = vec![
        doc("tax assessment annulled"),
        doc("penalty waived tribunal"),
        doc("customs declaration dispute"),
    ];
    let sparse_corpus = vec![doc("income tax recalculated")];

    let scorer = TableScorer::new(&[
        ("tax assessment annulled", 0.1),
        ("customs declaration dispute", 0.9),
    ]);
    let engine = engine(store, sparse_corpus, scorer, RetrievalConfig::default());

    let result = engine.retrieve("penalty tax").await.unwrap();

    // 0.9 first, 0.1 last; the two 0.5 defaults keep merge order
    assert_eq!(
        contents(&result),
        vec![
            "customs declaration dispute",
            "penalty waived tribunal",
            "income tax recalculated",
            "tax assessment annulled",
        ]
    );
}

#[tokio::test]
async fn top_k_bounds_the_result() {
    let mut store = FakeStore::default();
    store.nearest = (0..15).map(|i| doc(&format!("dense passage {}", i))).collect();

    let scorer = TableScorer::new(&[]);
    let engine = engine(store, vec![], scorer, RetrievalConfig::default());

    let result = engine.retrieve("passage").await.unwrap();
    assert_eq!(result.documents.len(), 10);
}

#[tokio::test]
async fn fewer_candidates_than_k_pass_through() {
    let mut store = FakeStore::default();
    store.nearest = vec![doc("only hit")];

    let scorer = TableScorer::new(&[]);
    let engine = engine(store, vec![], scorer, RetrievalConfig::default());

    let result = engine.retrieve("anything").await.unwrap();
    assert_eq!(result.documents.len(), 1);
}

#[tokio::test]
async fn empty_retrievers_yield_empty_result_not_error() {
    let scorer = TableScorer::new(&[]);
    let engine = engine(
        FakeStore::default(),
        vec![],
        scorer.clone(),
        RetrievalConfig::default(),
    );

    let result = engine.retrieve("no matches anywhere").await.unwrap();

    assert!(result.is_empty());
    assert_eq!(result.strategy, RetrievalStrategy::Hybrid);
    assert_eq!(scorer.call_count(), 0, "nothing to rerank");
}

#[tokio::test]
async fn slow_dense_branch_degrades_to_sparse() {
    let mut store = FakeStore::default();
    store.nearest = vec![doc("dense passage never arrives")];
    store.nearest_delay = Some(Duration::from_millis(200));

    let sparse_corpus = vec![doc("penalty waived tribunal")];

    let scorer = TableScorer::new(&[]);
    let config = RetrievalConfig {
        retriever_timeout: Duration::from_millis(20),
        ..RetrievalConfig::default()
    };
    let engine = engine(store, sparse_corpus, scorer, config);

    let result = engine.retrieve("penalty").await.unwrap();

    assert_eq!(contents(&result), vec!["penalty waived tribunal"]);
}

#[tokio::test]
async fn slow_dense_branch_with_empty_sparse_is_empty_not_error() {
    let mut store = FakeStore::default();
    store.nearest = vec![doc("dense passage never arrives")];
    store.nearest_delay = Some(Duration::from_millis(200));

    let scorer = TableScorer::new(&[]);
    let config = RetrievalConfig {
        retriever_timeout: Duration::from_millis(20),
        ..RetrievalConfig::default()
    };
    let engine = engine(store, vec![], scorer, config);

    // The sparse branch answered (with nothing), so this is an empty
    // result rather than a timeout failure
    let result = engine.retrieve("penalty").await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn store_failure_fails_the_call() {
    let mut store = FakeStore::default();
    store.fail_nearest = true;

    let scorer = TableScorer::new(&[]);
    let engine = engine(store, vec![], scorer, RetrievalConfig::default());

    let err = engine.retrieve("penalty").await.unwrap_err();
    assert!(matches!(err, AppError::DatabaseConnection { .. }));
}

#[tokio::test]
async fn scorer_failure_surfaces_as_retrieval_failure() {
    let mut store = FakeStore::default();
    store.nearest = vec![doc("tax assessment annulled")];

    let engine = engine(
        store,
        vec![],
        Arc::new(FailingScorer),
        RetrievalConfig::default(),
    );

    let err = engine.retrieve("penalty").await.unwrap_err();
    assert!(matches!(err, AppError::RerankerError { .. }));
}

#[tokio::test]
async fn malformed_score_count_is_a_failure() {
    let mut store = FakeStore::default();
    store.nearest = vec![
        doc("tax assessment annulled"),
        doc("penalty waived tribunal"),
    ];

    let engine = engine(
        store,
        vec![],
        Arc::new(MalformedScorer),
        RetrievalConfig::default(),
    );

    let err = engine.retrieve("penalty").await.unwrap_err();
    assert!(matches!(err, AppError::RerankerError { .. }));
}

#[tokio::test]
async fn lexical_swap_is_visible_to_later_queries() {
    let scorer = TableScorer::new(&[]);
    let engine = engine(
        FakeStore::default(),
        vec![],
        scorer,
        RetrievalConfig::default(),
    );

    assert_eq!(engine.lexical_len().await, 0);
    let before = engine.retrieve("penalty waived").await.unwrap();
    assert!(before.is_empty());

    engine
        .swap_lexical(Bm25Index::from_documents(vec![doc("penalty waived tribunal")]))
        .await;

    assert_eq!(engine.lexical_len().await, 1);
    let after = engine.retrieve("penalty waived").await.unwrap();
    assert_eq!(contents(&after), vec!["penalty waived tribunal"]);
}
