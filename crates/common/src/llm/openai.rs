//! OpenAI-compatible chat completions client (OpenAI, Groq, vLLM...)

use super::{prompts, LanguageModel};
use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str =
    "You are a precise assistant for an airline analytics system. Follow the output format exactly.";

pub struct OpenAiCompatibleModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl OpenAiCompatibleModel {
    pub fn new(
        endpoint: String,
        api_key: String,
        model: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig, api_key: String) -> Result<Self> {
        Self::new(
            config.endpoint.clone(),
            api_key,
            config.model.clone(),
            config.temperature,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream {
                message: format!("LLM API request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| AppError::Upstream {
            message: format!("Failed to parse LLM response: {}", e),
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Upstream {
                message: "LLM returned no choices".to_string(),
            })
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    async fn classify_intent(&self, utterance: &str, labels: &[&str]) -> Result<String> {
        self.complete(&prompts::classify_intent(utterance, labels)).await
    }

    async fn extract_entities(&self, utterance: &str, intent: &str) -> Result<String> {
        self.complete(&prompts::extract_entities(utterance, intent)).await
    }

    async fn infer_parameters(&self, utterance: &str, vocabulary: &[&str]) -> Result<String> {
        self.complete(&prompts::infer_parameters(utterance, vocabulary)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            temperature: 0.0,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["temperature"], 0.0);
    }

    #[test]
    fn test_response_parsing_tolerates_null_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert!(response.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        let model = OpenAiCompatibleModel::new(
            "http://127.0.0.1:9/v1/chat/completions".into(),
            "key".into(),
            "m".into(),
            0.0,
            Duration::from_millis(500),
        )
        .unwrap();

        let err = model.classify_intent("hello", &["analyze_delays"]).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}
