//! Graph store abstraction
//!
//! Provides a unified interface for executing parameterized Cypher:
//! - Neo4j over the HTTP transactional endpoint
//! - In-memory mock for tests and offline development

mod mock;
mod neo4j;
mod value;

pub use mock::{ExecutedQuery, MockGraphStore};
pub use neo4j::Neo4jHttpStore;
pub use value::{Composite, CompositeKind, GraphRow, GraphValue, Scalar};

use crate::config::GraphConfig;
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Named query parameters, bound as `$name` inside the query text
pub type QueryParams = serde_json::Map<String, serde_json::Value>;

/// Trait for graph query execution
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute a parameterized query and return every row.
    ///
    /// Store-side failures surface as `AppError::StoreExecution` carrying the
    /// store's own message.
    async fn run(&self, cypher: &str, params: &QueryParams) -> Result<Vec<GraphRow>>;

    /// Cheap liveness check used by readiness probes
    async fn ping(&self) -> Result<()>;

    /// Store name for logs and metrics
    fn name(&self) -> &str;
}

/// Create a graph store based on configuration
pub fn create_graph_store(config: &GraphConfig) -> Result<Arc<dyn GraphStore>> {
    match config.provider.as_str() {
        "neo4j" => Ok(Arc::new(Neo4jHttpStore::from_config(config)?)),
        "mock" => Ok(Arc::new(MockGraphStore::new())),
        other => {
            tracing::warn!(provider = other, "Unknown graph provider, using mock");
            Ok(Arc::new(MockGraphStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_factory_falls_back_to_mock() {
        let mut config = AppConfig::default().graph;
        config.provider = "memgraph".into();

        let store = create_graph_store(&config).unwrap();
        assert_eq!(store.name(), "mock");
        assert!(store.ping().await.is_ok());
    }

    #[test]
    fn test_factory_builds_neo4j() {
        let config = AppConfig::default().graph;
        let store = create_graph_store(&config).unwrap();
        assert_eq!(store.name(), "neo4j");
    }
}
