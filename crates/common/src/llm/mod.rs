//! Language model abstraction
//!
//! Three narrow text-in/text-out calls back the query pipeline:
//! intent classification, entity extraction and semantic parameter
//! inference. Parsing the returned text is the caller's job.

mod mock;
mod openai;
mod prompts;

pub use mock::MockLanguageModel;
pub use openai::OpenAiCompatibleModel;
pub use prompts::SCHEMA_CONTEXT;

use crate::config::LlmConfig;
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for language model calls
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Pick exactly one of `labels` for the utterance (or "unknown")
    async fn classify_intent(&self, utterance: &str, labels: &[&str]) -> Result<String>;

    /// Extract a JSON object of entity slots for an already-classified intent
    async fn extract_entities(&self, utterance: &str, intent: &str) -> Result<String>;

    /// Map qualitative wording to a JSON object restricted to `vocabulary`
    async fn infer_parameters(&self, utterance: &str, vocabulary: &[&str]) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a language model client based on configuration
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    match config.provider.as_str() {
        "openai" => match &config.api_key {
            Some(key) if !key.is_empty() => {
                Ok(Arc::new(OpenAiCompatibleModel::from_config(config, key.clone())?))
            }
            _ => {
                tracing::warn!("No language model API key configured, using mock");
                Ok(Arc::new(MockLanguageModel::new()))
            }
        },
        "mock" => Ok(Arc::new(MockLanguageModel::new())),
        other => {
            tracing::warn!(provider = other, "Unknown language model provider, using mock");
            Ok(Arc::new(MockLanguageModel::new()))
        }
    }
}
