use super::LanguageModel;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock language model for testing
///
/// Replies with canned text and counts calls per method. With no canned
/// replies it behaves like a model that understands nothing: `unknown`
/// intent, `{}` for both JSON calls.
pub struct MockLanguageModel {
    intent: String,
    entities: String,
    parameters: String,
    unavailable: bool,
    classify_calls: AtomicUsize,
    extract_calls: AtomicUsize,
    infer_calls: AtomicUsize,
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self {
            intent: "unknown".to_string(),
            entities: "{}".to_string(),
            parameters: "{}".to_string(),
            unavailable: false,
            classify_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            infer_calls: AtomicUsize::new(0),
        }
    }
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intent(mut self, reply: impl Into<String>) -> Self {
        self.intent = reply.into();
        self
    }

    pub fn with_entities(mut self, reply: impl Into<String>) -> Self {
        self.entities = reply.into();
        self
    }

    pub fn with_parameters(mut self, reply: impl Into<String>) -> Self {
        self.parameters = reply.into();
        self
    }

    /// Every call fails as if the endpoint were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    pub fn infer_calls(&self) -> usize {
        self.infer_calls.load(Ordering::SeqCst)
    }

    fn reply(&self, counter: &AtomicUsize, text: &str) -> Result<String> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(AppError::Upstream {
                message: "mock language model unavailable".to_string(),
            });
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn classify_intent(&self, _utterance: &str, _labels: &[&str]) -> Result<String> {
        self.reply(&self.classify_calls, &self.intent)
    }

    async fn extract_entities(&self, _utterance: &str, _intent: &str) -> Result<String> {
        self.reply(&self.extract_calls, &self.entities)
    }

    async fn infer_parameters(&self, _utterance: &str, _vocabulary: &[&str]) -> Result<String> {
        self.reply(&self.infer_calls, &self.parameters)
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_replies_and_counters() {
        let model = MockLanguageModel::new()
            .with_intent("analyze_delays")
            .with_parameters(r#"{"min_delay": 30}"#);

        assert_eq!(model.classify_intent("x", &[]).await.unwrap(), "analyze_delays");
        assert_eq!(model.extract_entities("x", "analyze_delays").await.unwrap(), "{}");
        assert_eq!(model.infer_parameters("x", &[]).await.unwrap(), r#"{"min_delay": 30}"#);
        assert_eq!(model.classify_calls(), 1);
        assert_eq!(model.extract_calls(), 1);
        assert_eq!(model.infer_calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_model_still_counts() {
        let model = MockLanguageModel::unavailable();
        assert!(model.infer_parameters("x", &[]).await.is_err());
        assert_eq!(model.infer_calls(), 1);
    }
}
