//! RS.ge RAG API Gateway
//!
//! The single entry point for questions against the tribunal decision
//! corpus. Startup connects the document store, builds the in-memory
//! lexical index over the full corpus, wires the model clients into the
//! retrieval engine and serves:
//! - POST /ask            question answering with generated answers
//! - POST /search         raw retrieval without the generation step
//! - POST /index/rebuild  out-of-band lexical index rebuild
//! - GET  /health, /ready

mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use rsge_common::{
    config::AppConfig, db::DbPool, embeddings, generation, metrics, rerank, Generator, Repository,
    VERSION,
};
use rsge_search::{RetrievalConfig, RetrievalEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<RetrievalEngine>,
    pub generator: Arc<dyn Generator>,
    pub repo: Repository,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting RS.ge RAG gateway v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

        let metrics_addr =
            SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("retrieval_duration_seconds".to_string()),
                metrics::RETRIEVAL_BUCKETS,
            )?
            .set_buckets_for_metric(
                Matcher::Suffix("generation_duration_seconds".to_string()),
                metrics::MODEL_CALL_BUCKETS,
            )?
            .set_buckets_for_metric(
                Matcher::Suffix("embedding_duration_seconds".to_string()),
                metrics::MODEL_CALL_BUCKETS,
            )?
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);

    // Model clients
    let embedder = embeddings::create_embedder(&config.embedding)?;
    let scorer = rerank::create_scorer(&config.reranker)?;
    let generator = generation::create_generator(&config.generation)?;

    // Build the lexical index over the full corpus
    info!("Building lexical index...");
    let lexical =
        handlers::index::build_lexical_index(&repo, config.retrieval.scan_batch_size).await?;
    metrics::record_lexical_index_size(lexical.len());
    info!(chunks = lexical.len(), "Lexical index ready");

    // Construct the retrieval engine
    let engine = Arc::new(RetrievalEngine::new(
        Arc::new(repo.clone()),
        lexical,
        embedder,
        scorer,
        RetrievalConfig::from(&config.retrieval),
    ));

    let state = AppState {
        config: config.clone(),
        engine,
        generator,
        repo,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // The original UI is served from anywhere, so CORS stays wide open
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Rate-limited API routes
    let mut api_routes = Router::new()
        .route("/ask", post(handlers::ask::ask))
        .route("/search", post(handlers::search::search))
        .route("/index/rebuild", post(handlers::index::rebuild));

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        api_routes = api_routes.route_layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    // Health endpoints bypass rate limiting
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(request_id)
                .layer(propagate_id),
        )
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
