//! Resolution handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use flightgraph_common::{
    errors::{AppError, ErrorDetails, Result},
    graph::QueryParams,
};
use flightgraph_engine::{
    EntityBag, Intent, ParameterBag, QuerySource, RawEntities, Resolution, ResultRow,
};

/// Resolve request: an already-classified intent plus its entities
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveRequest {
    #[validate(length(min = 1, max = 64))]
    pub intent: String,

    /// Flat entity bag as produced by upstream extraction
    #[serde(default)]
    pub entities: RawEntities,

    #[validate(length(min = 1, max = 2000))]
    pub utterance: String,
}

/// Ask request: free text, classified and extracted server-side
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 2000))]
    pub utterance: String,
}

/// Resolution response. `query` is always present, empty when resolution
/// stopped before a query existed.
#[derive(Serialize)]
pub struct ResolutionResponse {
    pub request_id: Uuid,
    pub intent: String,
    pub entities: EntityBag,
    pub inferred: ParameterBag,
    pub query: String,
    pub parameters: QueryParams,
    pub source: Option<QuerySource>,
    pub row_count: usize,
    pub rows: Vec<ResultRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    pub resolved_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

/// Explain response: the planned query, never executed
#[derive(Serialize)]
pub struct ExplainResponse {
    pub request_id: Uuid,
    pub intent: String,
    pub query: String,
    pub parameters: QueryParams,
    pub source: QuerySource,
}

#[derive(Serialize)]
pub struct IntentsResponse {
    pub intents: Vec<IntentInfo>,
}

#[derive(Serialize)]
pub struct IntentInfo {
    pub label: &'static str,
    pub default_template: Option<&'static str>,
    pub templates: Vec<TemplateInfo>,
}

#[derive(Serialize)]
pub struct TemplateInfo {
    pub name: &'static str,
    pub required: &'static [&'static str],
}

fn validate(request: &impl Validate) -> Result<()> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

/// Reuse the id set by the request-id layer so logs and body agree
fn request_id(headers: &HeaderMap) -> Uuid {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::new_v4)
}

fn into_response(
    resolution: Resolution,
    request_id: Uuid,
    start: Instant,
) -> (StatusCode, Json<ResolutionResponse>) {
    let Resolution { intent, entities, parameters, query, outcome } = resolution;

    let (query, bound, source) = match query {
        Some(q) => (q.cypher, q.params, Some(q.source)),
        None => (String::new(), QueryParams::new(), None),
    };

    let (status, rows, error) = match outcome {
        Ok(rows) => (StatusCode::OK, rows, None),
        Err(e) => {
            let status = e.status_code();
            if e.is_server_error() {
                tracing::error!(request_id = %request_id, intent = %intent, error = %e, "Resolution failed");
            } else {
                tracing::warn!(request_id = %request_id, intent = %intent, error = %e, "Resolution rejected");
            }
            let mut details = e.to_details();
            details.request_id = Some(request_id.to_string());
            (status, Vec::new(), Some(details))
        }
    };

    let response = ResolutionResponse {
        request_id,
        intent,
        entities,
        inferred: parameters,
        query,
        parameters: bound,
        source,
        row_count: rows.len(),
        rows,
        error,
        resolved_at: Utc::now(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    (status, Json(response))
}

/// Resolve a classified intent and run the query
pub async fn resolve(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> Result<(StatusCode, Json<ResolutionResponse>)> {
    let start = Instant::now();
    validate(&request)?;

    let resolution = state
        .engine
        .resolve(&request.intent, &request.entities, &request.utterance)
        .await;

    Ok(into_response(resolution, request_id(&headers), start))
}

/// Classify, extract and resolve free text
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Result<(StatusCode, Json<ResolutionResponse>)> {
    let start = Instant::now();
    validate(&request)?;

    let resolution = state.engine.ask(&request.utterance).await;

    Ok(into_response(resolution, request_id(&headers), start))
}

/// Show the query a request would run without touching the store
pub async fn explain(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ExplainResponse>> {
    validate(&request)?;

    let planned = state
        .engine
        .plan(&request.intent, &request.entities, &request.utterance)
        .await?;

    tracing::info!(intent = %request.intent, source = %planned.source, "Query explained");

    Ok(Json(ExplainResponse {
        request_id: request_id(&headers),
        intent: request.intent,
        query: planned.cypher,
        parameters: planned.params,
        source: planned.source,
    }))
}

/// List intents with their templates in matching order
pub async fn list_intents(State(state): State<AppState>) -> Json<IntentsResponse> {
    let registry = state.engine.registry();

    let intents = Intent::ALL
        .into_iter()
        .map(|intent| IntentInfo {
            label: intent.label(),
            default_template: registry.default_for(intent).map(|t| t.name),
            templates: registry
                .templates_for(intent)
                .iter()
                .map(|t| TemplateInfo { name: t.name, required: t.required })
                .collect(),
        })
        .collect();

    Json(IntentsResponse { intents })
}

#[cfg(test)]
mod tests {
    use crate::test_support::router;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use flightgraph_common::graph::{GraphRow, GraphValue, MockGraphStore};
    use flightgraph_common::llm::MockLanguageModel;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn send(app: axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_resolve_returns_query_and_rows() {
        let store = Arc::new(MockGraphStore::with_rows(vec![
            GraphRow::new().with("generation", GraphValue::text("Boomer")),
        ]));
        let app = router(store.clone(), Arc::new(MockLanguageModel::new()));

        let (status, body) = send(
            app,
            "POST",
            "/v1/resolve",
            json!({
                "intent": "analyze_satisfaction",
                "entities": {"generation": "Boomers"},
                "utterance": "How do Boomers rate the food?"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"]["kind"], "template");
        assert_eq!(body["source"]["name"], "satisfaction.generation");
        assert_eq!(body["parameters"]["generation"], "Boomer");
        assert_eq!(body["rows"][0]["generation"], "Boomer");
        assert!(body["query"].as_str().unwrap().contains("$generation"));
        assert!(body.get("error").is_none());
        assert!(body["request_id"].is_string());
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_intent_is_unprocessable() {
        let store = Arc::new(MockGraphStore::new());
        let app = router(store.clone(), Arc::new(MockLanguageModel::new()));

        let (status, body) = send(
            app,
            "POST",
            "/v1/resolve",
            json!({"intent": "book_flight", "utterance": "book me a flight"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["query"], "");
        assert_eq!(body["error"]["code"], "UNKNOWN_INTENT");
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_keeps_query() {
        let store = Arc::new(MockGraphStore::failing("Neo.ClientError.Statement.SyntaxError"));
        let app = router(store, Arc::new(MockLanguageModel::new()));

        let (status, body) = send(
            app,
            "POST",
            "/v1/resolve",
            json!({"intent": "analyze_delays", "entities": {}, "utterance": "how are delays?"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["query"].as_str().unwrap().is_empty());
        assert_eq!(body["error"]["code"], "STORE_EXECUTION_ERROR");
        assert_eq!(body["rows"], json!([]));
    }

    #[tokio::test]
    async fn test_empty_utterance_rejected() {
        let app = router(Arc::new(MockGraphStore::new()), Arc::new(MockLanguageModel::new()));
        let (status, body) = send(app, "POST", "/v1/ask", json!({"utterance": ""})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_ask_uses_model() {
        let store = Arc::new(MockGraphStore::new());
        let model = Arc::new(
            MockLanguageModel::new()
                .with_intent("search_network")
                .with_entities(r#"{"origin": "sfo", "dest": "ord"}"#),
        );
        let app = router(store.clone(), model);

        let (status, body) = send(app, "POST", "/v1/ask", json!({"utterance": "routes from SFO to ORD"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "search_network");
        assert_eq!(body["source"]["name"], "network.route");
        assert_eq!(body["parameters"], json!({"origin": "SFO", "dest": "ORD"}));
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_explain_never_executes() {
        let store = Arc::new(MockGraphStore::new());
        let app = router(store.clone(), Arc::new(MockLanguageModel::new()));

        let (status, body) = send(
            app,
            "POST",
            "/v1/explain",
            json!({
                "intent": "analyze_delays",
                "entities": {"origin": "LAX", "dest": "IAX"},
                "utterance": "find severe delays for flights from LAX to IAX"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"]["kind"], "fallback");
        assert_eq!(body["parameters"]["min_delay"], 61);
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn test_explain_unresolvable_names_missing_keys() {
        let app = router(Arc::new(MockGraphStore::new()), Arc::new(MockLanguageModel::new()));

        let (status, body) = send(
            app,
            "POST",
            "/v1/explain",
            json!({"intent": "lookup_details", "utterance": "look up my booking"}),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNRESOLVABLE_ENTITIES");
        assert_eq!(body["error"]["details"]["missing_entities"], json!(["record_locator", "feedback_id"]));
    }

    #[tokio::test]
    async fn test_list_intents() {
        let app = router(Arc::new(MockGraphStore::new()), Arc::new(MockLanguageModel::new()));
        let request = Request::get("/v1/intents").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        let intents = body["intents"].as_array().unwrap();
        assert_eq!(intents.len(), 6);
        let lookup = intents.iter().find(|i| i["label"] == "lookup_details").unwrap();
        assert!(lookup["default_template"].is_null());
        assert_eq!(lookup["templates"][0]["required"].as_array().unwrap().len(), 2);
    }
}
