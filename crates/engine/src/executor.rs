//! Query execution against the graph store

use flightgraph_common::errors::Result;
use flightgraph_common::graph::{GraphRow, GraphStore, QueryParams};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Where the query text came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuerySource {
    Template { name: &'static str },
    Fallback,
}

impl QuerySource {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            QuerySource::Template { name } => *name,
            QuerySource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for QuerySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Query text plus the parameters bound to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQuery {
    pub cypher: String,
    pub params: QueryParams,
    pub source: QuerySource,
}

/// Runs resolved queries. No retries; store failures come back as
/// `AppError::StoreExecution` for the caller to handle.
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn GraphStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, query: &ResolvedQuery) -> Result<Vec<GraphRow>> {
        let start = Instant::now();
        let result = self.store.run(&query.cypher, &query.params).await;

        match &result {
            Ok(rows) => tracing::debug!(
                source = %query.source,
                rows = rows.len(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Query executed"
            ),
            Err(e) => tracing::error!(
                source = %query.source,
                store = self.store.name(),
                error = %e,
                "Query execution failed"
            ),
        }

        result
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightgraph_common::errors::AppError;
    use flightgraph_common::graph::{GraphValue, MockGraphStore};

    fn query() -> ResolvedQuery {
        let mut params = QueryParams::new();
        params.insert("origin".into(), "LAX".into());
        ResolvedQuery {
            cypher: "MATCH (o:Airport {station_code: $origin}) RETURN o".into(),
            params,
            source: QuerySource::Fallback,
        }
    }

    #[tokio::test]
    async fn test_execute_binds_params() {
        let store = Arc::new(MockGraphStore::with_rows(vec![
            GraphRow::new().with("o", GraphValue::node([("station_code", GraphValue::text("LAX"))])),
        ]));
        let executor = QueryExecutor::new(store.clone());

        let rows = executor.execute(&query()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.calls()[0].params["origin"], "LAX");
    }

    #[tokio::test]
    async fn test_store_error_is_typed() {
        let executor = QueryExecutor::new(Arc::new(MockGraphStore::failing("Unknown function 'foo'")));
        let err = executor.execute(&query()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreExecution { message } if message == "Unknown function 'foo'"));
    }

    #[test]
    fn test_source_serialization() {
        let source = QuerySource::Template { name: "delays.route" };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["kind"], "template");
        assert_eq!(json["name"], "delays.route");
        assert_eq!(source.label(), "delays.route");
    }
}
