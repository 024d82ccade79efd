//! FlightGraph API Gateway
//!
//! HTTP surface for the query resolution engine.
//! Handles:
//! - Request validation and routing
//! - Rate limiting
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use flightgraph_common::{
    config::AppConfig,
    graph::create_graph_store,
    llm::create_language_model,
    metrics::{self, LATENCY_BUCKETS},
};
use flightgraph_engine::QueryEngine;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<QueryEngine>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::load()?);
    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting FlightGraph API Gateway v{}",
        flightgraph_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(LATENCY_BUCKETS)?
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Prometheus exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Collaborators
    let store = create_graph_store(&config.graph)?;
    let model = create_language_model(&config.llm)?;
    info!(store = store.name(), model = model.model_name(), "Collaborators ready");

    let state = AppState {
        config: config.clone(),
        engine: Arc::new(QueryEngine::new(store, model)),
    };

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut api_routes = Router::new()
        // Probes
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Catalog
        .route("/intents", get(handlers::resolve::list_intents))

        // Resolution
        .route("/resolve", post(handlers::resolve::resolve))
        .route("/ask", post(handlers::resolve::ask))
        .route("/explain", post(handlers::resolve::explain));

    let limits = &state.config.rate_limit;
    if limits.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(limits.requests_per_second, limits.burst);
        api_routes = api_routes.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit_middleware,
        ));
    }

    Router::new()
        .nest("/v1", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_metrics))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use flightgraph_common::graph::MockGraphStore;
    use flightgraph_common::llm::MockLanguageModel;

    /// Router over mock collaborators with rate limiting off
    pub fn router(store: Arc<MockGraphStore>, model: Arc<MockLanguageModel>) -> Router {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        create_router(AppState {
            config: Arc::new(config),
            engine: Arc::new(QueryEngine::new(store, model)),
        })
    }
}
