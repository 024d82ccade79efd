//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub graph_store: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: flightgraph_common::VERSION,
    })
}

/// Readiness probe - checks the graph store answers a trivial query
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let start = std::time::Instant::now();
    let store = state.engine.store();

    let store_check = match store.ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            provider: store.name().to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            provider: store.name().to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let all_healthy = store_check.status == "up";

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            graph_store: store_check,
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::router;
    use axum::{body::Body, http::Request};
    use flightgraph_common::graph::MockGraphStore;
    use flightgraph_common::llm::MockLanguageModel;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn get_json(store: MockGraphStore, uri: &str) -> serde_json::Value {
        let app = router(Arc::new(store), Arc::new(MockLanguageModel::new()));
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let body = get_json(MockGraphStore::new(), "/v1/health").await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_reports_store() {
        let body = get_json(MockGraphStore::new(), "/v1/ready").await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["checks"]["graph_store"]["provider"], "mock");

        let body = get_json(MockGraphStore::failing("connection refused"), "/v1/ready").await;
        assert_eq!(body["status"], "not_ready");
        assert_eq!(body["checks"]["graph_store"]["status"], "down");
    }
}
