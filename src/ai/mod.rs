use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info};

mod error;
mod response;
#[cfg(test)]
mod tests;

pub use error::AIError;
pub use response::Completion;

use crate::config::{AIConfig, AIProvider};

const OLLAMA_URL: &str = "http://localhost:11434";
const ANTHROPIC_URL: &str = "https://api.anthropic.com";
const OPENAI_URL: &str = "https://api.openai.com";

/// The language model collaborator: one prompt in, text out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, AIError>;

    /// Human-readable `provider:model` label.
    fn describe(&self) -> String;
}

pub struct HttpModelClient {
    client: reqwest::Client,
    config: AIConfig,
}

impl HttpModelClient {
    pub fn new(config: &AIConfig) -> Result<Self, AIError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AIError::Client(e.to_string()))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.api_url.as_deref().unwrap_or(match self.config.provider {
            AIProvider::Ollama => OLLAMA_URL,
            AIProvider::Anthropic => ANTHROPIC_URL,
            AIProvider::OpenAI => OPENAI_URL,
        });
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    fn request_parts(&self, prompt: &str) -> Result<(String, HeaderMap, Value), AIError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let model = &self.config.model;
        let max_tokens = self.config.max_tokens;

        let parts = match self.config.provider {
            AIProvider::Ollama => (
                self.endpoint("/api/chat"),
                headers,
                json!({
                    "model": model,
                    "stream": false,
                    "options": { "num_predict": max_tokens },
                    "messages": [{ "role": "user", "content": prompt }]
                }),
            ),
            AIProvider::Anthropic => {
                let api_key = self
                    .config
                    .anthropic_api_key
                    .as_ref()
                    .ok_or(AIError::MissingApiKey("Anthropic"))?;
                headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
                headers.insert(
                    "x-api-key",
                    HeaderValue::from_str(api_key)
                        .map_err(|e| AIError::InvalidApiKey(e.to_string()))?,
                );
                (
                    self.endpoint("/v1/messages"),
                    headers,
                    json!({
                        "model": model,
                        "max_tokens": max_tokens,
                        "messages": [{ "role": "user", "content": prompt }]
                    }),
                )
            }
            AIProvider::OpenAI => {
                let api_key = self
                    .config
                    .openai_api_key
                    .as_ref()
                    .ok_or(AIError::MissingApiKey("OpenAI"))?;
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", api_key))
                        .map_err(|e| AIError::InvalidApiKey(e.to_string()))?,
                );
                (
                    self.endpoint("/v1/chat/completions"),
                    headers,
                    json!({
                        "model": model,
                        "max_tokens": max_tokens,
                        "messages": [{ "role": "user", "content": prompt }]
                    }),
                )
            }
        };
        Ok(parts)
    }

    fn payload(&self, body: Value) -> Value {
        match self.config.provider {
            AIProvider::Ollama => match body.get("message") {
                Some(message) => Value::Array(vec![message.clone()]),
                None => body,
            },
            AIProvider::Anthropic => match body.get("content") {
                Some(content) => content.clone(),
                None => body,
            },
            AIProvider::OpenAI => match body.get("choices").and_then(Value::as_array) {
                Some(choices) => Value::Array(
                    choices
                        .iter()
                        .filter_map(|c| c.get("message").cloned())
                        .collect(),
                ),
                None => body,
            },
        }
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, AIError> {
        let (url, headers, body) = self.request_parts(prompt)?;
        info!("sending {} byte prompt to {}", prompt.len(), self.describe());

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout(self.config.timeout_secs)
                } else {
                    AIError::Unreachable {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let provider = self.config.provider.as_str();
        match response.status() {
            status if status.is_success() => (),
            StatusCode::TOO_MANY_REQUESTS => return Err(AIError::RateLimited { provider }),
            StatusCode::UNAUTHORIZED => return Err(AIError::Unauthorized { provider }),
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unreadable body>".to_string());
                return Err(AIError::Status {
                    provider,
                    status,
                    body,
                });
            }
        }

        let response_text = response.text().await.map_err(|e| AIError::Unreachable {
            endpoint: url.clone(),
            reason: format!("body read failed: {}", e),
        })?;
        debug!("raw model response: {} bytes", response_text.len());

        let body: Value = serde_json::from_str(&response_text)
            .map_err(|e| AIError::malformed(e, &response_text))?;

        let completion = Completion::normalize(&self.payload(body));
        if completion.text.trim().is_empty() {
            return Err(AIError::EmptyAnswer);
        }
        Ok(completion)
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.config.provider.as_str(), self.config.model)
    }
}
