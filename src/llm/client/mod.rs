//! LLM client for registry fact extraction.
//!
//! Supports Ollama for local inference and any OpenAI-compatible chat
//! completions API.

mod config;
mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::rate_limit::{backoff_delay, parse_retry_after};

pub use config::{LlmConfig, LlmProvider};
pub use prompts::{DEFAULT_ADDRESSES_PROMPT, DEFAULT_OFFICE_PROMPT};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Still rate limited after all retries
    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// Provider needs an API key that is not configured
    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

impl LlmError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout(e.to_string())
        } else if e.is_decode() {
            LlmError::Parse(e.to_string())
        } else {
            LlmError::Connection(e.to_string())
        }
    }
}

/// A language-understanding service that answers one prompt with free text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send a single prompt and return the raw response text.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// OpenAI chat completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl ChatResponse {
    fn into_text(self) -> Result<String, LlmError> {
        if let Some(error) = self.error {
            return Err(LlmError::Api(error.message));
        }
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::Parse("Response contained no choices".to_string()))
    }
}

/// LLM client for document processing.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is reachable.
    pub async fn is_available(&self) -> bool {
        let request = match self.config.provider {
            LlmProvider::Ollama => self
                .client
                .get(format!("{}/api/tags", self.config.endpoint)),
            LlmProvider::OpenAI => {
                let Some(ref key) = self.config.api_key else {
                    return false;
                };
                self.client
                    .get(format!("{}/v1/models", self.config.endpoint))
                    .bearer_auth(key)
            }
        };

        match request.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// POST a JSON body, retrying on 429 with exponential backoff.
    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<Response, LlmError> {
        let mut attempt = 0;
        loop {
            let mut request = self.client.post(url).json(body);
            if let Some(ref key) = self.config.api_key {
                request = request.bearer_auth(key);
            }

            let resp = request.send().await.map_err(LlmError::from_reqwest)?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = resp
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                if attempt >= self.config.max_retries {
                    return Err(LlmError::RateLimited {
                        retry_after_secs: retry_after.and_then(|s| s.trim().parse().ok()),
                    });
                }

                let wait = parse_retry_after(retry_after.as_deref())
                    .unwrap_or_else(|| backoff_delay(attempt, 1000));
                warn!(
                    "{} rate limited (attempt {}), waiting {:?}",
                    self.config.provider_name(),
                    attempt + 1,
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
                continue;
            }

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
            }

            return Ok(resp);
        }
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self.post_json(&url, &request).await?;
        let ollama_resp: OllamaResponse = resp.json().await.map_err(LlmError::from_reqwest)?;

        Ok(ollama_resp.response)
    }

    /// Call an OpenAI-compatible chat completions API with a prompt.
    async fn call_openai(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        if self.config.api_key.is_none() {
            return Err(LlmError::MissingApiKey(self.config.availability_hint()));
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let resp = self.post_json(&url, &request).await?;
        let chat_resp: ChatResponse = resp.json().await.map_err(LlmError::from_reqwest)?;

        chat_resp.into_text()
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        debug!(
            "Sending {} char prompt to {} ({})",
            prompt.chars().count(),
            self.config.provider_name(),
            self.config.model
        );
        match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(prompt, temperature).await,
            LlmProvider::OpenAI => self.call_openai(prompt, temperature).await,
        }
    }
}
