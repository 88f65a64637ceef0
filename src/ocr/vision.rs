//! Google Cloud Vision OCR backend implementation.
//!
//! Sends each page image to the `images:annotate` endpoint with the
//! `DOCUMENT_TEXT_DETECTION` feature, which handles dense printed Japanese
//! well. Requires an API key (`GOOGLE_VISION_API_KEY`).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Google Vision OCR backend.
pub struct VisionBackend {
    api_key: Option<String>,
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: VisionImage,
    features: Vec<VisionFeature>,
}

#[derive(Debug, Serialize)]
struct VisionImage {
    content: String,
}

#[derive(Debug, Serialize)]
struct VisionFeature {
    #[serde(rename = "type")]
    feature_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
    error: Option<VisionError>,
}

#[derive(Debug, Deserialize)]
struct AnnotateImageResponse {
    #[serde(rename = "fullTextAnnotation")]
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<VisionError>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct VisionError {
    #[serde(default)]
    message: String,
}

impl VisionBackend {
    /// Create a Vision backend from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::OcrFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.vision_api_key.clone(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client,
        })
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point the backend at a different annotate endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_request(image_bytes: &[u8]) -> AnnotateRequest {
        AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: VisionImage {
                    content: base64::engine::general_purpose::STANDARD.encode(image_bytes),
                },
                features: vec![VisionFeature {
                    feature_type: "DOCUMENT_TEXT_DETECTION",
                }],
            }],
        }
    }
}

/// Pull the page text out of an annotate response.
///
/// A per-image error is a recognition failure. A response without any text
/// annotation is a blank page.
fn page_text(response: AnnotateResponse) -> Result<String, OcrError> {
    if let Some(error) = response.error {
        return Err(OcrError::OcrFailed(format!(
            "Vision API error: {}",
            error.message
        )));
    }

    let image = response.responses.into_iter().next().ok_or_else(|| {
        OcrError::OcrFailed("Vision API returned no responses".to_string())
    })?;

    if let Some(error) = image.error {
        if !error.message.is_empty() {
            return Err(OcrError::OcrFailed(error.message));
        }
    }

    Ok(image
        .full_text_annotation
        .map(|annotation| annotation.text)
        .unwrap_or_default())
}

#[async_trait]
impl OcrBackend for VisionBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Vision
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.api_key.is_none() {
            "GOOGLE_VISION_API_KEY not set. Create a key with the Cloud Vision API enabled"
                .to_string()
        } else {
            "Google Vision is available".to_string()
        }
    }

    async fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            OcrError::BackendNotAvailable("GOOGLE_VISION_API_KEY not set".to_string())
        })?;

        let image_bytes = tokio::fs::read(image_path).await?;
        let request = Self::build_request(&image_bytes);

        debug!(
            "Vision: annotating {} ({} bytes)",
            image_path.display(),
            image_bytes.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::OcrFailed(format!(
                "Vision API error ({}): {}",
                status, body
            )));
        }

        let annotate: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::OcrFailed(format!("Failed to parse response: {}", e)))?;

        page_text(annotate)
    }
}
