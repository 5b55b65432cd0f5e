//! Chat completions client.
//!
//! Sends one prompt (with optional system instructions) to an
//! OpenAI-compatible `/chat/completions` endpoint and returns the text of
//! the first choice. Every call is attempted exactly once.

use crate::config::Config;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Settings for one LLM client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

impl LlmSettings {
    /// Extract LLM settings from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            model_name: config.llm.model.clone(),
            temperature: config.llm.temperature,
            timeout_seconds: config.llm.timeout_seconds,
            api_key: config.credentials.llm_api_key.clone(),
        }
    }
}

/// Message in a chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the hosted LLM.
pub struct LlmClient {
    settings: LlmSettings,
    http_client: reqwest::Client,
}

impl LlmClient {
    /// Create a client sharing the given HTTP connection pool.
    pub fn new(settings: LlmSettings, http_client: reqwest::Client) -> Self {
        Self {
            settings,
            http_client,
        }
    }

    /// Name of the model this client talks to.
    pub fn model_name(&self) -> &str {
        &self.settings.model_name
    }

    /// Send a prompt and return the model's text.
    pub async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .context("LLM API key is not configured (OPENAI_API_KEY)")?;

        let url = format!("{}/chat/completions", self.settings.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatRequest {
            model: self.settings.model_name.clone(),
            messages,
            temperature: self.settings.temperature,
        };

        debug!(
            "Sending completion request to {} ({} prompt chars)",
            self.settings.model_name,
            prompt.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(self.settings.timeout_seconds))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.settings.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to LLM API at {}", self.settings.base_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("LLM API error {}: {}", status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("LLM response contained no message content")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": content } } ]
        })
        .to_string()
    }

    pub(crate) fn settings(base_url: String) -> LlmSettings {
        LlmSettings {
            base_url,
            model_name: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_seconds: 5,
            api_key: Some("sk-test".to_string()),
        }
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.llm.base_url = "http://localhost:9000/v1/".to_string();
        let settings = LlmSettings::from_config(&config);
        assert_eq!(settings.base_url, "http://localhost:9000/v1");
        assert_eq!(settings.model_name, "gpt-4o-mini");
        assert!(settings.api_key.is_none());
    }

    #[tokio::test]
    async fn test_complete_returns_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hello" }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("hi there"))
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new(settings(server.url()), reqwest::Client::new());
        let text = client.complete(Some("be brief"), "hello").await.unwrap();

        mock.assert_async().await;
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .expect(1)
            .create_async()
            .await;

        let client = LlmClient::new(settings(server.url()), reqwest::Client::new());
        let err = client.complete(None, "hello").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_complete_without_key_makes_no_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let mut settings = settings(server.url());
        settings.api_key = None;
        let client = LlmClient::new(settings, reqwest::Client::new());

        let err = client.complete(None, "hello").await.unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = LlmClient::new(settings(server.url()), reqwest::Client::new());
        assert!(client.complete(None, "hello").await.is_err());
    }
}
