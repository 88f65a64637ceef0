//! Registry fact extraction from OCR text.
//!
//! Two independent LLM queries run over the same document text: one for the
//! registry office name, one for the addresses of inheritance/merger
//! ownership transfers. The raw answers are untrusted; the office name is cut
//! down to one line and the addresses go through [`normalize_addresses`].

mod address;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::{CompletionService, LlmConfig, LlmError};
use crate::ocr::DocumentText;

pub use address::{
    has_address_shape, normalize_address, normalize_addresses, strip_marker, strip_parcel_count,
};

/// Extraction queries are decoded greedily so repeated runs agree.
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

/// The two questions asked about a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionQuery {
    /// Registry office name; exactly one line expected.
    OfficeName,
    /// Transfer addresses; zero or more lines, one address each.
    Addresses,
}

impl ExtractionQuery {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionQuery::OfficeName => "office name",
            ExtractionQuery::Addresses => "address list",
        }
    }
}

impl std::fmt::Display for ExtractionQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A query whose LLM call failed or timed out.
#[derive(Debug, Error)]
#[error("{query} extraction failed: {source}")]
pub struct ExtractionServiceError {
    pub query: ExtractionQuery,
    #[source]
    pub source: LlmError,
}

/// Facts extracted from one registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Registry office name, empty if it could not be extracted.
    pub registry_office: String,
    /// Normalized addresses in extraction order, duplicates included.
    pub addresses: Vec<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.registry_office.is_empty() && self.addresses.is_empty()
    }
}

/// Asks the LLM for registry facts.
pub struct FactExtractor {
    service: Arc<dyn CompletionService>,
    office_prompt: String,
    addresses_prompt: String,
    max_content_chars: Option<usize>,
}

impl FactExtractor {
    /// Create an extractor with the default prompts.
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self::from_config(service, &LlmConfig::default())
    }

    /// Create an extractor using the prompts and limits from `config`.
    pub fn from_config(service: Arc<dyn CompletionService>, config: &LlmConfig) -> Self {
        Self {
            service,
            office_prompt: config.get_office_prompt().to_string(),
            addresses_prompt: config.get_addresses_prompt().to_string(),
            max_content_chars: config.max_content_chars,
        }
    }

    /// Extract the registry office name printed at the head of the document.
    ///
    /// Only the first non-empty line of the answer counts.
    pub async fn extract_registry_office(
        &self,
        document: &DocumentText,
    ) -> Result<String, ExtractionServiceError> {
        let response = self.ask(ExtractionQuery::OfficeName, document).await?;
        Ok(first_line(&response).to_string())
    }

    /// Extract the raw address lines of inheritance/merger transfers.
    ///
    /// Lines are returned as the service wrote them; run them through
    /// [`normalize_addresses`] before use.
    pub async fn extract_addresses(
        &self,
        document: &DocumentText,
    ) -> Result<Vec<String>, ExtractionServiceError> {
        let response = self.ask(ExtractionQuery::Addresses, document).await?;
        Ok(response.lines().map(str::to_string).collect())
    }

    /// Render the prompt for a query.
    pub fn build_prompt(&self, query: ExtractionQuery, document: &DocumentText) -> String {
        let template = match query {
            ExtractionQuery::OfficeName => &self.office_prompt,
            ExtractionQuery::Addresses => &self.addresses_prompt,
        };
        template.replace("{content}", self.truncate_content(document.as_str()))
    }

    async fn ask(
        &self,
        query: ExtractionQuery,
        document: &DocumentText,
    ) -> Result<String, ExtractionServiceError> {
        let prompt = self.build_prompt(query, document);
        debug!("Requesting {} extraction", query);

        let response = self
            .service
            .complete(&prompt, EXTRACTION_TEMPERATURE)
            .await
            .map_err(|source| ExtractionServiceError { query, source })?;

        debug!("{} response: {} lines", query, response.lines().count());
        Ok(response)
    }

    /// Truncate content to the configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        let Some(max) = self.max_content_chars else {
            return text;
        };
        if text.len() <= max {
            return text;
        }
        let mut end = max;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        warn!(
            "Document text truncated from {} to {} bytes for extraction",
            text.len(),
            end
        );
        &text[..end]
    }
}

/// First non-empty line, trimmed.
fn first_line(response: &str) -> &str {
    response
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}
