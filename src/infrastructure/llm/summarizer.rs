//! README summarizer backed by an OpenAI-compatible chat completions endpoint
//!
//! Gemini exposes such an endpoint, so the default configuration points there.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{DomainError, ReadmeSummarizer, ReadmeSummary};

pub const DEFAULT_SUMMARIZER_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_SUMMARIZER_MODEL: &str = "gemini-2.0-flash";

const SOURCE: &str = "summarizer";
const PROMPT_PREFIX: &str = "Summarize this github repository from this readme file content:";

/// Chat-completions client producing a [`ReadmeSummary`] via structured output
#[derive(Debug)]
pub struct ChatReadmeSummarizer<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl<C: HttpClientTrait> ChatReadmeSummarizer<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: DEFAULT_SUMMARIZER_BASE_URL.to_string(),
            model: DEFAULT_SUMMARIZER_MODEL.to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, readme: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{
                "role": "user",
                "content": format!("{}\n{}", PROMPT_PREFIX, readme),
            }],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "repository_summary",
                    "strict": true,
                    "schema": summary_schema(),
                }
            }
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ReadmeSummary, DomainError> {
        let response: ChatResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::upstream(SOURCE, format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DomainError::upstream(SOURCE, "No content in response"))?;

        serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
            DomainError::upstream(SOURCE, format!("Malformed summary output: {}", e))
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> ReadmeSummarizer for ChatReadmeSummarizer<C> {
    async fn summarize(&self, readme: &str) -> Result<ReadmeSummary, DomainError> {
        debug!(model = %self.model, readme_len = readme.len(), "Requesting README summary");

        let body = self.build_request(readme);
        let response = self
            .client
            .post_json(&self.chat_completions_url(), self.headers(), &body)
            .await?;

        self.parse_response(response)
    }
}

fn summary_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "A summary of the repository"
            },
            "cool_facts": {
                "type": "array",
                "items": { "type": "string" },
                "description": "A list of cool facts about the repository"
            }
        },
        "required": ["summary", "cool_facts"],
        "additionalProperties": false
    })
}

/// Some models wrap JSON output in a markdown fence even in structured mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const TEST_URL: &str =
        "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gemini-2.0-flash",
            "choices": [{
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_summarize_parses_structured_content() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            completion(r#"{"summary":"A web framework","cool_facts":["fast","typed"]}"#),
        );
        let summarizer = ChatReadmeSummarizer::new(client, "test-key");

        let summary = summarizer.summarize("# Axum").await.unwrap();

        assert_eq!(summary.summary, "A web framework");
        assert_eq!(summary.cool_facts, vec!["fast", "typed"]);
    }

    #[tokio::test]
    async fn test_summarize_request_body() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, completion(r#"{"summary":"s","cool_facts":[]}"#));
        let summarizer = ChatReadmeSummarizer::new(client, "test-key");

        summarizer.summarize("hello readme").await.unwrap();

        let requests = summarizer.client.requests();
        assert_eq!(requests.len(), 1);
        let body = &requests[0];
        assert_eq!(body["model"], "gemini-2.0-flash");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_schema");
        let prompt = body["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.starts_with(PROMPT_PREFIX));
        assert!(prompt.ends_with("hello readme"));
    }

    #[tokio::test]
    async fn test_summarize_fenced_output() {
        let client = MockHttpClient::new().with_response(
            TEST_URL,
            completion("```json\n{\"summary\":\"fenced\",\"cool_facts\":[\"a\"]}\n```"),
        );
        let summarizer = ChatReadmeSummarizer::new(client, "k");

        let summary = summarizer.summarize("x").await.unwrap();
        assert_eq!(summary.summary, "fenced");
    }

    #[tokio::test]
    async fn test_summarize_malformed_output() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, completion("I cannot do that"));
        let summarizer = ChatReadmeSummarizer::new(client, "k");

        let result = summarizer.summarize("x").await;
        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_summarize_no_choices() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, serde_json::json!({ "choices": [] }));
        let summarizer = ChatReadmeSummarizer::new(client, "k");

        let result = summarizer.summarize("x").await;
        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_summarize_custom_base_url_and_model() {
        let custom_url = "http://localhost:8080/v1/chat/completions";
        let client = MockHttpClient::new()
            .with_response(custom_url, completion(r#"{"summary":"s","cool_facts":[]}"#));
        let summarizer = ChatReadmeSummarizer::new(client, "k")
            .with_base_url("http://localhost:8080/v1/")
            .with_model("gpt-4o-mini");

        summarizer.summarize("x").await.unwrap();
        assert_eq!(summarizer.client.requests()[0]["model"], "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_summarize_upstream_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "quota exhausted");
        let summarizer = ChatReadmeSummarizer::new(client, "k");

        let result = summarizer.summarize("x").await;
        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{}"), "{}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }
}
