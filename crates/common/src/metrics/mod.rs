//! Metrics and observability utilities
//!
//! Prometheus metrics with SLO-aligned histograms and standardized
//! naming conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all service metrics
pub const METRICS_PREFIX: &str = "rsge_rag";

/// SLO-aligned histogram buckets for retrieval latency (in seconds).
/// The reranking pass dominates, so the tail stretches further than a
/// plain DB query would need.
pub const RETRIEVAL_BUCKETS: &[f64] = &[
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms - P50 target
    1.000, // 1s
    2.500, // 2.5s - P99 target
    5.000, // 5s
    10.00, // 10s
];

/// Buckets for external model calls (embedding, reranking, generation)
pub const MODEL_CALL_BUCKETS: &[f64] = &[
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.000, // 2s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Retrieval metrics
    describe_counter!(
        format!("{}_retrievals_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of retrieval calls by strategy"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );

    describe_gauge!(
        format!("{}_retrieval_candidates", METRICS_PREFIX),
        Unit::Count,
        "Merged candidate count fed to the reranker"
    );

    describe_gauge!(
        format!("{}_retrieval_results", METRICS_PREFIX),
        Unit::Count,
        "Documents returned from retrieval"
    );

    // Ask metrics
    describe_counter!(
        format!("{}_questions_total", METRICS_PREFIX),
        Unit::Count,
        "Total questions answered"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Answer generation latency in seconds"
    );

    // Embedding metrics
    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    // Lexical index metrics
    describe_gauge!(
        format!("{}_lexical_index_size", METRICS_PREFIX),
        Unit::Count,
        "Chunks in the in-memory lexical index"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_decisions_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total decisions ingested"
    );

    describe_counter!(
        format!("{}_chunks_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks created"
    );

    tracing::info!("Metrics registered");
}

/// Record one retrieval call
pub fn record_retrieval(duration_secs: f64, strategy: &str, candidates: usize, results: usize) {
    counter!(
        format!("{}_retrievals_total", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_retrieval_candidates", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .set(candidates as f64);

    gauge!(
        format!("{}_retrieval_results", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .set(results as f64);
}

/// Record one answered question
pub fn record_question(generation_secs: f64, model: &str) {
    counter!(format!("{}_questions_total", METRICS_PREFIX)).increment(1);

    histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .record(generation_secs);
}

/// Record an embedding request
pub fn record_embedding(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_embedding_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

/// Record the lexical index size after a build or rebuild
pub fn record_lexical_index_size(chunks: usize) {
    gauge!(format!("{}_lexical_index_size", METRICS_PREFIX)).set(chunks as f64);
}

/// Record ingestion of one decision
pub fn record_ingestion(chunks_created: usize) {
    counter!(format!("{}_decisions_ingested_total", METRICS_PREFIX)).increment(1);

    counter!(format!("{}_chunks_created_total", METRICS_PREFIX))
        .increment(chunks_created as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in RETRIEVAL_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
        assert!(RETRIEVAL_BUCKETS.contains(&0.500));
        assert!(RETRIEVAL_BUCKETS.contains(&2.500));
    }

    #[test]
    fn test_record_helpers_run() {
        record_retrieval(0.2, "hybrid", 80, 10);
        record_question(1.5, "gemini-2.5-flash");
        record_lexical_index_size(1000);
        // Just verify they run without panic
    }
}
