use super::{GraphRow, GraphStore, QueryParams};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A query the mock store was asked to run
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub cypher: String,
    pub params: QueryParams,
}

/// Mock store for testing: returns canned rows and records every call
#[derive(Default)]
pub struct MockGraphStore {
    rows: Vec<GraphRow>,
    failure: Option<String>,
    calls: Mutex<Vec<ExecutedQuery>>,
}

impl MockGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<GraphRow>) -> Self {
        Self { rows, ..Self::default() }
    }

    /// Store that rejects every query with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ExecutedQuery> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn run(&self, cypher: &str, params: &QueryParams) -> Result<Vec<GraphRow>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ExecutedQuery {
                cypher: cypher.to_string(),
                params: params.clone(),
            });
        }

        match &self.failure {
            Some(message) => Err(AppError::StoreExecution { message: message.clone() }),
            None => Ok(self.rows.clone()),
        }
    }

    async fn ping(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(AppError::StoreExecution { message: message.clone() }),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphValue;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let store = MockGraphStore::with_rows(vec![GraphRow::new().with("n", GraphValue::integer(1))]);
        let mut params = QueryParams::new();
        params.insert("origin".into(), "LAX".into());

        let rows = store.run("MATCH (n) RETURN n", &params).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(store.call_count(), 1);
        assert_eq!(store.calls()[0].params["origin"], "LAX");
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let store = MockGraphStore::failing("boom");
        let err = store.run("RETURN 1", &QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, AppError::StoreExecution { message } if message == "boom"));
        assert_eq!(store.call_count(), 1);
    }
}
