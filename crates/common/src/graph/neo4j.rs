//! Neo4j client over the HTTP transactional API

use super::{GraphRow, GraphStore, GraphValue, QueryParams};
use crate::config::GraphConfig;
use crate::errors::{AppError, Result};
use crate::metrics::record_store_query;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Neo4j store speaking `POST /db/{database}/tx/commit`
pub struct Neo4jHttpStore {
    client: reqwest::Client,
    commit_url: String,
    username: String,
    password: Option<String>,
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a QueryParams,
    #[serde(rename = "resultDataContents")]
    result_data_contents: [&'static str; 1],
}

#[derive(Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<StoreError>,
}

#[derive(Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Deserialize)]
struct RowData {
    row: Vec<Value>,
    #[serde(default)]
    meta: Vec<Value>,
}

#[derive(Deserialize)]
struct StoreError {
    #[serde(default)]
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    pub fn new(
        uri: &str,
        database: &str,
        username: String,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            commit_url: format!("{}/db/{}/tx/commit", uri.trim_end_matches('/'), database),
            username,
            password,
        })
    }

    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        Self::new(
            &config.uri,
            &config.database,
            config.username.clone(),
            config.password.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn commit(&self, cypher: &str, params: &QueryParams) -> Result<Vec<GraphRow>> {
        let request = CommitRequest {
            statements: vec![Statement {
                statement: cypher,
                parameters: params,
                result_data_contents: ["row"],
            }],
        };

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, self.password.as_deref())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::StoreExecution {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StoreExecution {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let body: CommitResponse = response.json().await.map_err(|e| AppError::StoreExecution {
            message: format!("Failed to parse response: {}", e),
        })?;

        convert_response(body)
    }
}

fn convert_response(body: CommitResponse) -> Result<Vec<GraphRow>> {
    if let Some(err) = body.errors.into_iter().next() {
        tracing::debug!(code = %err.code, "Store rejected statement");
        return Err(AppError::StoreExecution { message: err.message });
    }

    let Some(result) = body.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    let rows = result
        .data
        .into_iter()
        .map(|data| {
            let mut row = GraphRow::new();
            for (i, (column, value)) in result.columns.iter().zip(data.row).enumerate() {
                row.push(column.clone(), GraphValue::from_json(value, data.meta.get(i)));
            }
            row
        })
        .collect();

    Ok(rows)
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn run(&self, cypher: &str, params: &QueryParams) -> Result<Vec<GraphRow>> {
        let start = Instant::now();
        let result = self.commit(cypher, params).await;

        record_store_query(start.elapsed().as_secs_f64(), self.name(), result.is_ok());
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Graph query failed");
        }

        result
    }

    async fn ping(&self) -> Result<()> {
        self.commit("RETURN 1 AS ok", &QueryParams::new()).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "neo4j"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::CompositeKind;
    use serde_json::json;

    fn parse(value: Value) -> CommitResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_commit_url_strips_trailing_slash() {
        let store = Neo4jHttpStore::new(
            "http://localhost:7474/",
            "airline",
            "neo4j".into(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(store.commit_url, "http://localhost:7474/db/airline/tx/commit");
    }

    #[test]
    fn test_request_body_shape() {
        let mut params = QueryParams::new();
        params.insert("origin".into(), json!("LAX"));
        let request = CommitRequest {
            statements: vec![Statement {
                statement: "MATCH (a:Airport {code: $origin}) RETURN a",
                parameters: &params,
                result_data_contents: ["row"],
            }],
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["statements"][0]["parameters"]["origin"], "LAX");
        assert_eq!(body["statements"][0]["resultDataContents"][0], "row");
    }

    #[test]
    fn test_rows_keep_column_order_and_entity_tags() {
        let body = parse(json!({
            "results": [{
                "columns": ["p", "journey_count"],
                "data": [{
                    "row": [{"record_locator": "EPXXW8"}, 3],
                    "meta": [{"id": 1, "type": "node", "deleted": false}, null]
                }]
            }],
            "errors": []
        }));

        let rows = convert_response(body).unwrap();
        assert_eq!(rows.len(), 1);
        let columns: Vec<&str> = rows[0].iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["p", "journey_count"]);
        assert!(matches!(
            rows[0].get("p"),
            Some(GraphValue::Composite(c)) if c.kind == CompositeKind::Node
        ));
    }

    #[test]
    fn test_store_error_message_is_verbatim() {
        let body = parse(json!({
            "results": [],
            "errors": [{
                "code": "Neo.ClientError.Statement.SyntaxError",
                "message": "Invalid input 'RETRUN'"
            }]
        }));

        match convert_response(body) {
            Err(AppError::StoreExecution { message }) => {
                assert_eq!(message, "Invalid input 'RETRUN'")
            }
            other => panic!("expected store error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_results() {
        let rows = convert_response(parse(json!({"results": [], "errors": []}))).unwrap();
        assert!(rows.is_empty());
    }
}
