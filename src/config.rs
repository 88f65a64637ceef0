//! Configuration management for tokiscan using the prefer crate.
//!
//! A config file is optional. When present it is discovered by prefer in the
//! standard locations (`tokiscan.toml`, `tokiscan.yaml`, `tokiscan.json`, ...)
//! and parsed with serde. Environment variables are applied on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::LlmConfig;
use crate::ocr::OcrConfig;

/// Errors loading an explicit config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Page rasterization and OCR settings.
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Extraction LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    ///
    /// Falls back to defaults when no config file is found or the discovered
    /// file cannot be parsed.
    pub async fn load() -> Self {
        match prefer::load("tokiscan").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("Ignoring config file {}: {}", path.display(), e);
                        Self::default_with_env()
                    }
                },
                None => Self::default_with_env(),
            },
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default_with_env()
            }
        }
    }

    /// Default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Apply environment variable overrides to every section.
    pub fn with_env_overrides(mut self) -> Self {
        self.ocr = self.ocr.with_env_overrides();
        self.llm = self.llm.with_env_overrides();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmProvider;
    use crate::ocr::OcrBackendType;
    use tempfile::TempDir;

    #[test]
    fn test_parse_toml() {
        let config = Config::parse(
            r#"
[ocr]
backend = "vision"
dpi = 200
page_concurrency = 4

[llm]
provider = "openai"
model = "gpt-4o"
endpoint = "https://api.openai.com"
"#,
            "toml",
        )
        .unwrap();

        assert_eq!(config.ocr.backend, OcrBackendType::Vision);
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(config.ocr.page_concurrency, 4);
        assert_eq!(config.ocr.language, "jpn");
        assert_eq!(config.llm.provider, LlmProvider::OpenAI);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_retries, LlmConfig::default().max_retries);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = Config::parse("ocr:\n  language: jpn+eng\n", "yml").unwrap();
        assert_eq!(yaml.ocr.language, "jpn+eng");
        assert_eq!(yaml.llm, LlmConfig::default());

        let json = Config::parse(r#"{"llm": {"max_content_chars": 20000}}"#, "json").unwrap();
        assert_eq!(json.llm.max_content_chars, Some(20000));
        assert_eq!(json.ocr, OcrConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::parse("", "toml").unwrap(), Config::default());
    }

    #[test]
    fn test_parse_error_names_format() {
        let err = Config::parse("[ocr\n", "toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));
    }

    #[test]
    fn test_api_keys_are_not_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());
        config.ocr.vision_api_key = Some("vision-secret".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokiscan.toml");
        std::fs::write(&path, "[ocr]\ndpi = 150\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.ocr.dpi, 150);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_load_from_missing_path() {
        let err = Config::load_from_path(Path::new("/nonexistent/tokiscan.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
