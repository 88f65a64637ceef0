//! LLM client configuration.
//!
//! Env vars: LLM_PROVIDER, LLM_ENDPOINT, LLM_MODEL, LLM_API_KEY,
//! OPENAI_API_KEY (auto-selects the OpenAI provider).

use serde::{Deserialize, Serialize};

use super::prompts::{DEFAULT_ADDRESSES_PROMPT, DEFAULT_OFFICE_PROMPT};

const OPENAI_ENDPOINT: &str = "https://api.openai.com";
const OPENAI_MODEL: &str = "gpt-4o";

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    #[serde(alias = "groq", alias = "together")]
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// Configuration for the LLM client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (ollama or openai)
    #[serde(default)]
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for both extraction queries
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for OpenAI-compatible providers
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after a 429 response before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Maximum characters of document text to send (unlimited when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_content_chars: Option<usize>,
    /// Custom prompt for the registry office query (uses {content} placeholder)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_prompt: Option<String>,
    /// Custom prompt for the address list query (uses {content} placeholder)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addresses_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:14b-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            max_content_chars: None,
            office_prompt: None,
            addresses_prompt: None,
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_PROVIDER`: "ollama" (default), "openai", "groq", or "together"
    /// - `LLM_ENDPOINT`: API endpoint (defaults based on provider)
    /// - `LLM_API_KEY`: API key for OpenAI-compatible providers
    /// - `LLM_MODEL`: Model name
    /// - `OPENAI_API_KEY`: selects OpenAI when no provider is set explicitly
    ///
    /// Priority: LLM_PROVIDER wins over auto-detection from API keys.
    pub fn with_env_overrides(mut self) -> Self {
        let explicit_provider = std::env::var("LLM_PROVIDER").ok();
        let explicit_endpoint = std::env::var("LLM_ENDPOINT").ok();
        let explicit_model = std::env::var("LLM_MODEL").ok();

        if let Ok(val) = std::env::var("LLM_API_KEY") {
            self.api_key = Some(val);
        }

        if let Some(ref val) = explicit_provider {
            match LlmProvider::from_str(val) {
                Some(provider) => self.provider = provider,
                None => tracing::warn!("Ignoring unknown LLM_PROVIDER '{}'", val),
            }

            if explicit_endpoint.is_none() {
                match val.to_lowercase().as_str() {
                    "groq" => self.endpoint = "https://api.groq.com/openai".to_string(),
                    "openai" => self.endpoint = OPENAI_ENDPOINT.to_string(),
                    "together" => self.endpoint = "https://api.together.xyz".to_string(),
                    _ => {}
                }
            }

            if self.api_key.is_none() {
                match val.to_lowercase().as_str() {
                    "groq" => self.api_key = std::env::var("GROQ_API_KEY").ok(),
                    "openai" => self.api_key = std::env::var("OPENAI_API_KEY").ok(),
                    _ => {}
                }
            }

            if explicit_model.is_none() && val.eq_ignore_ascii_case("openai") {
                self.model = OPENAI_MODEL.to_string();
            }
        } else if self.api_key.is_none() && self.provider == LlmProvider::Ollama {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                self.api_key = Some(key);
                self.provider = LlmProvider::OpenAI;
                if explicit_endpoint.is_none() {
                    self.endpoint = OPENAI_ENDPOINT.to_string();
                }
                if self.model == default_model() {
                    self.model = OPENAI_MODEL.to_string();
                }
            }
        }

        if let Some(endpoint) = explicit_endpoint {
            self.endpoint = endpoint;
        }
        if let Some(model) = explicit_model {
            self.model = model;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Get the office-name prompt, using custom or default.
    pub fn get_office_prompt(&self) -> &str {
        self.office_prompt.as_deref().unwrap_or(DEFAULT_OFFICE_PROMPT)
    }

    /// Get the address-list prompt, using custom or default.
    pub fn get_addresses_prompt(&self) -> &str {
        self.addresses_prompt
            .as_deref()
            .unwrap_or(DEFAULT_ADDRESSES_PROMPT)
    }

    /// Get the provider name for display.
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Ollama => "Ollama",
            LlmProvider::OpenAI => {
                if self.endpoint.contains("groq.com") {
                    "Groq"
                } else if self.endpoint.contains("together.xyz") {
                    "Together.ai"
                } else {
                    "OpenAI"
                }
            }
        }
    }

    /// Get a provider-aware availability hint for error messages.
    pub fn availability_hint(&self) -> String {
        match self.provider {
            LlmProvider::Ollama => format!(
                "Ollama not available at {}. Make sure Ollama is running: ollama serve",
                self.endpoint
            ),
            LlmProvider::OpenAI => {
                if self.api_key.is_none() {
                    "OpenAI API key not set. Set OPENAI_API_KEY or LLM_API_KEY".to_string()
                } else {
                    format!("OpenAI API not available at {}", self.endpoint)
                }
            }
        }
    }
}
