use std::str::FromStr;
use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error as ThisError;

use super::extract::{ExtractReason, extract_text};
use crate::core::AppConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            other => Err(anyhow!("Unknown LLM provider: {}", other)),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Failure to turn a prompt into text. `NoText` is kept apart from
/// transport errors so the API can report it distinctly.
#[derive(Debug, ThisError)]
pub enum CompletionError {
    #[error("Completion returned no usable text ({0})")]
    NoText(ExtractReason),
    #[error(transparent)]
    Request(#[from] Error),
}

#[derive(Clone, Debug)]
pub struct CompletionClient {
    provider: Provider,
    api_hostname: String,
    api_key: String,
    model: String,
}

impl CompletionClient {
    pub fn new(provider: Provider, api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            provider,
            api_hostname: api_hostname.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.llm_provider,
            &config.llm_api_hostname,
            &config.llm_api_key,
            &config.llm_model,
        )
    }

    /// Send a single prompt and return the raw JSON response.
    pub async fn completion(&self, prompt: &str) -> Result<Value, Error> {
        let request = match self.provider {
            Provider::Gemini => {
                let url = format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.api_hostname, self.model
                );
                let payload = json!({
                    "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
                });
                reqwest::Client::new()
                    .post(url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&payload)
            }
            Provider::OpenAi => {
                let url = format!("{}/v1/chat/completions", self.api_hostname);
                let payload = json!({
                    "model": self.model,
                    "messages": vec![Message::new(Role::User, prompt)],
                });
                reqwest::Client::new()
                    .post(url)
                    .bearer_auth(&self.api_key)
                    .json(&payload)
            }
        };

        let response = request
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60 * 2))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response)
    }

    /// Send a prompt and return the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let resp = self.completion(prompt).await?;
        let extraction = extract_text(&resp);
        match extraction.text {
            Some(text) => Ok(text),
            None => {
                tracing::warn!(
                    "Completion had no text ({}). Resp: {}",
                    extraction.reason,
                    resp
                );
                Err(CompletionError::NoText(extraction.reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_generates_text_from_gemini() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-1.0-pro:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "Hi there"}]}}]}"#)
            .create_async()
            .await;

        let client =
            CompletionClient::new(Provider::Gemini, &server.url(), "test-key", "gemini-1.0-pro");
        let text = client.generate("Hello").await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn it_generates_text_from_openai_compatible_api() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi there"}}]}"#,
            )
            .create_async()
            .await;

        let client = CompletionClient::new(Provider::OpenAi, &server.url(), "test-key", "gpt-4");
        assert_eq!(client.generate("Hello").await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn it_distinguishes_empty_completion() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-1.0-pro:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": ""}]}}]}"#)
            .create_async()
            .await;

        let client =
            CompletionClient::new(Provider::Gemini, &server.url(), "test-key", "gemini-1.0-pro");
        let err = client.generate("Hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::NoText(ExtractReason::Empty)));
    }

    #[tokio::test]
    async fn it_fails_on_upstream_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-1.0-pro:generateContent")
            .with_status(500)
            .create_async()
            .await;

        let client =
            CompletionClient::new(Provider::Gemini, &server.url(), "test-key", "gemini-1.0-pro");
        let err = client.generate("Hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::Request(_)));
    }

    #[test]
    fn it_parses_provider_names() {
        assert_eq!(Provider::from_str("Gemini").unwrap(), Provider::Gemini);
        assert_eq!(Provider::from_str("openai").unwrap(), Provider::OpenAi);
        assert!(Provider::from_str("llama").is_err());
    }
}
