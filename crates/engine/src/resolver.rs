//! Query resolution pipeline
//!
//! intent + raw entities + utterance
//!   -> normalize -> infer thresholds -> template match | fallback
//!   -> execute -> serialize

use crate::entities::{normalize, parse_raw_entities, EntityBag, RawEntities};
use crate::executor::{QueryExecutor, QuerySource, ResolvedQuery};
use crate::fallback::synthesize;
use crate::parameters::{ParameterBag, ParameterInferencer, PARAMETER_KEYS};
use crate::serializer::{serialize, ResultRow};
use crate::templates::{bound_params, Intent, TemplateRegistry};
use flightgraph_common::errors::{AppError, Result};
use flightgraph_common::graph::{GraphStore, QueryParams};
use flightgraph_common::llm::LanguageModel;
use flightgraph_common::metrics::record_resolution;
use std::sync::Arc;
use std::time::Instant;

/// Label used when classification yields nothing the registry knows
pub const UNKNOWN_INTENT: &str = "unknown";

/// Everything decided for one request, kept for auditability
#[derive(Debug)]
pub struct Resolution {
    pub intent: String,
    pub entities: EntityBag,
    pub parameters: ParameterBag,
    /// Absent only when resolution stopped before a query existed
    pub query: Option<ResolvedQuery>,
    pub outcome: Result<Vec<ResultRow>>,
}

impl Resolution {
    fn failed(intent: &str, error: AppError) -> Self {
        Self {
            intent: intent.to_string(),
            entities: EntityBag::new(),
            parameters: ParameterBag::new(),
            query: None,
            outcome: Err(error),
        }
    }

    /// Resolved query text, empty when no query was produced
    pub fn query_text(&self) -> &str {
        self.query.as_ref().map(|q| q.cypher.as_str()).unwrap_or("")
    }

    pub fn rows(&self) -> &[ResultRow] {
        self.outcome.as_deref().unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&AppError> {
        self.outcome.as_ref().err()
    }
}

/// The Query Resolution Engine
pub struct QueryEngine {
    registry: &'static TemplateRegistry,
    inferencer: ParameterInferencer,
    executor: QueryExecutor,
    model: Arc<dyn LanguageModel>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn GraphStore>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            registry: TemplateRegistry::global(),
            inferencer: ParameterInferencer::new(model.clone()),
            executor: QueryExecutor::new(store),
            model,
        }
    }

    pub fn registry(&self) -> &'static TemplateRegistry {
        self.registry
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        self.executor.store()
    }

    /// Resolve and execute one already-classified request.
    ///
    /// Never panics or returns early: every failure is carried in
    /// `Resolution::outcome` next to whatever query text was produced.
    pub async fn resolve(&self, intent: &str, raw: &RawEntities, utterance: &str) -> Resolution {
        let start = Instant::now();

        let (entities, parameters, planned) = match Intent::from_label(intent) {
            Some(known) => self.prepare(known, raw, utterance).await,
            None => {
                tracing::info!(intent = intent, "Unknown intent, no query issued");
                return Resolution::failed(intent, AppError::UnknownIntent { intent: intent.to_string() });
            }
        };

        let query = match planned {
            Ok(query) => query,
            Err(e) => {
                tracing::info!(intent = intent, error = %e, "Resolution stopped before execution");
                return Resolution {
                    intent: intent.to_string(),
                    entities,
                    parameters,
                    query: None,
                    outcome: Err(e),
                };
            }
        };

        let outcome = self.executor.execute(&query).await.map(|rows| serialize(&rows));

        let rows = outcome.as_ref().map(Vec::len).unwrap_or(0);
        let latency = start.elapsed();
        record_resolution(latency.as_secs_f64(), intent, query.source.label(), rows, outcome.is_ok());
        tracing::info!(
            intent = intent,
            source = %query.source,
            rows = rows,
            latency_ms = latency.as_millis() as u64,
            success = outcome.is_ok(),
            "Resolution complete"
        );

        Resolution {
            intent: intent.to_string(),
            entities,
            parameters,
            query: Some(query),
            outcome,
        }
    }

    /// Resolve without executing: the query and its bound parameters
    pub async fn plan(&self, intent: &str, raw: &RawEntities, utterance: &str) -> Result<ResolvedQuery> {
        let known = Intent::from_label(intent).ok_or_else(|| AppError::UnknownIntent {
            intent: intent.to_string(),
        })?;
        self.prepare(known, raw, utterance).await.2
    }

    /// Classify, extract and resolve a free-form question
    pub async fn ask(&self, utterance: &str) -> Resolution {
        let labels = Intent::labels();
        let reply = match self.model.classify_intent(utterance, &labels).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Intent classification failed");
                return Resolution::failed(
                    UNKNOWN_INTENT,
                    AppError::Upstream { message: e.to_string() },
                );
            }
        };

        let intent = clean_label(&reply);
        let Some(known) = Intent::from_label(&intent) else {
            tracing::info!(reply = %reply.trim(), "Classifier returned no known intent");
            return self.resolve(UNKNOWN_INTENT, &RawEntities::new(), utterance).await;
        };

        let raw = match self.model.extract_entities(utterance, known.label()).await {
            Ok(text) => parse_raw_entities(&text).unwrap_or_else(|| {
                tracing::warn!("Entity extraction returned malformed JSON, continuing without entities");
                RawEntities::new()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Entity extraction failed, continuing without entities");
                RawEntities::new()
            }
        };

        self.resolve(known.label(), &raw, utterance).await
    }

    async fn prepare(
        &self,
        intent: Intent,
        raw: &RawEntities,
        utterance: &str,
    ) -> (EntityBag, ParameterBag, Result<ResolvedQuery>) {
        let mut entities = normalize(raw);

        // Thresholds supplied with the entities outrank anything inferred
        let mut seed = ParameterBag::new();
        for key in PARAMETER_KEYS {
            if let Some(value) = entities.remove(key).and_then(|v| v.as_integer()) {
                seed.set_if_absent(key, value);
            }
        }
        let parameters = self.inferencer.infer_over(utterance, seed).await;

        let mut available = QueryParams::new();
        for (key, value) in entities.iter() {
            available.insert(key.to_string(), value.to_json());
        }
        for (key, value) in parameters.iter() {
            available.insert(key.to_string(), value.into());
        }
        let keys: Vec<&str> = available.keys().map(String::as_str).collect();

        let resolved = if let Some(template) = self.registry.find(intent, &keys) {
            tracing::info!(intent = %intent, template = template.name, "Template selected");
            Ok((template.cypher.to_string(), QuerySource::Template { name: template.name }))
        } else if let Some(cypher) = synthesize(&keys) {
            tracing::info!(intent = %intent, keys = ?keys, "No complete template, synthesizing fallback");
            Ok((cypher, QuerySource::Fallback))
        } else {
            Err(AppError::UnresolvableEntities {
                intent: intent.label().to_string(),
                missing: self
                    .registry
                    .minimal_slots(intent)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
        };

        let planned = resolved.map(|(cypher, source)| {
            let params = bound_params(&cypher)
                .into_iter()
                .filter_map(|name| available.get(name).map(|v| (name.to_string(), v.clone())))
                .collect();
            ResolvedQuery { cypher, params, source }
        });

        (entities, parameters, planned)
    }
}

/// Classifier replies may carry quotes, fences, case or trailing punctuation
fn clean_label(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '.' || c.is_whitespace())
        .to_ascii_lowercase()
}
