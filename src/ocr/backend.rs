//! OCR backend abstraction.
//!
//! A backend turns one rasterized page image into text. Two backends exist:
//! - Tesseract: local OCR via command-line (CPU)
//! - Google Vision: cloud `DOCUMENT_TEXT_DETECTION` via REST

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model_utils::build_ocr_result;

/// Errors from OCR backends.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Extracted text content.
    pub text: String,
    /// Which backend produced this result.
    pub backend: OcrBackendType,
    /// Which model was used, for backends that have variants.
    pub model: Option<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Available OCR backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendType {
    /// Tesseract OCR via command-line.
    #[default]
    Tesseract,
    /// Google Cloud Vision API.
    #[serde(alias = "google", alias = "google-vision")]
    Vision,
}

impl OcrBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrBackendType::Tesseract => "tesseract",
            OcrBackendType::Vision => "vision",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tesseract" => Some(OcrBackendType::Tesseract),
            "vision" | "google" | "google-vision" => Some(OcrBackendType::Vision),
            _ => None,
        }
    }
}

impl std::fmt::Display for OcrBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for OCR backends.
///
/// A garbled page is still a success; only a backend that could not produce
/// any answer for the page returns an error.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Get the backend type.
    fn backend_type(&self) -> OcrBackendType;

    /// Check if this backend is available (binary installed, API key present).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Core OCR: extract text from an image file.
    async fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError>;

    /// Model name for this backend, if applicable.
    fn model_name(&self) -> Option<String> {
        None
    }

    /// Run OCR on an image file, returning a timed result.
    async fn ocr_image(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let text = self.run_ocr(image_path).await?;
        Ok(build_ocr_result(
            text,
            self.backend_type(),
            self.model_name(),
            start,
        ))
    }
}

/// Configuration for page rasterization and OCR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Which backend recognizes page images.
    #[serde(default)]
    pub backend: OcrBackendType,
    /// Tesseract language (e.g., "jpn", "jpn+eng").
    #[serde(default = "default_language")]
    pub language: String,
    /// Rasterization resolution.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Number of pages recognized at the same time (1 = strictly sequential).
    #[serde(default = "default_page_concurrency")]
    pub page_concurrency: usize,
    /// HTTP timeout for cloud backends, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Google Vision API key.
    #[serde(default, skip_serializing)]
    pub vision_api_key: Option<String>,
}

fn default_language() -> String {
    "jpn".to_string()
}

fn default_dpi() -> u32 {
    300
}

fn default_page_concurrency() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendType::default(),
            language: default_language(),
            dpi: default_dpi(),
            page_concurrency: default_page_concurrency(),
            timeout_secs: default_timeout_secs(),
            vision_api_key: None,
        }
    }
}

impl OcrConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `OCR_BACKEND`: "tesseract" (default) or "vision"
    /// - `OCR_LANGUAGE`: Tesseract language code
    /// - `GOOGLE_VISION_API_KEY`: API key for the vision backend
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("OCR_BACKEND") {
            match OcrBackendType::from_str(&val) {
                Some(backend) => self.backend = backend,
                None => tracing::warn!("Ignoring unknown OCR_BACKEND '{}'", val),
            }
        }
        if let Ok(val) = std::env::var("OCR_LANGUAGE") {
            self.language = val;
        }
        if let Ok(val) = std::env::var("GOOGLE_VISION_API_KEY") {
            self.vision_api_key = Some(val);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_names() {
        assert_eq!(OcrBackendType::from_str("Tesseract"), Some(OcrBackendType::Tesseract));
        assert_eq!(OcrBackendType::from_str("google"), Some(OcrBackendType::Vision));
        assert_eq!(OcrBackendType::from_str("paddle"), None);
        assert_eq!(OcrBackendType::Vision.to_string(), "vision");
    }

    #[test]
    fn test_default_config() {
        let config = OcrConfig::default();
        assert_eq!(config.backend, OcrBackendType::Tesseract);
        assert_eq!(config.language, "jpn");
        assert_eq!(config.dpi, 300);
        assert_eq!(config.page_concurrency, 1);
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: OcrConfig = toml::from_str("backend = \"vision\"").unwrap();
        assert_eq!(config.backend, OcrBackendType::Vision);
        assert_eq!(config.dpi, 300);
        assert!(config.vision_api_key.is_none());
    }
}
