//! Assembly of per-page OCR output into one document text.

use tracing::warn;

use super::backend::OcrError;

/// Outcome of recognizing one page.
#[derive(Debug)]
pub struct PageRecognitionResult {
    /// 1-based page number.
    pub page: u32,
    pub outcome: Result<String, OcrError>,
}

impl PageRecognitionResult {
    pub fn success(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            outcome: Ok(text.into()),
        }
    }

    pub fn failure(page: u32, error: OcrError) -> Self {
        Self {
            page,
            outcome: Err(error),
        }
    }
}

/// Recognized text of a whole document, in page order.
///
/// Empty text is valid: it means no page produced anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    text: String,
    page_count: usize,
    failed_pages: Vec<u32>,
}

impl DocumentText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when there is nothing but whitespace to extract from.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Number of pages the document had, including failed ones.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Page numbers whose recognition failed.
    pub fn failed_pages(&self) -> &[u32] {
        &self.failed_pages
    }
}

impl From<String> for DocumentText {
    fn from(text: String) -> Self {
        Self {
            text,
            page_count: 1,
            failed_pages: Vec::new(),
        }
    }
}

impl From<&str> for DocumentText {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl std::fmt::Display for DocumentText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Join successful page texts with newlines, keeping page order.
///
/// Failed pages contribute nothing but are logged and counted.
pub fn assemble(results: &[PageRecognitionResult]) -> DocumentText {
    let mut texts: Vec<&str> = Vec::with_capacity(results.len());
    let mut failed_pages = Vec::new();

    for result in results {
        match &result.outcome {
            Ok(text) => texts.push(text.as_str()),
            Err(e) => {
                warn!("OCR failed for page {}: {}", result.page, e);
                failed_pages.push(result.page);
            }
        }
    }

    DocumentText {
        text: texts.join("\n"),
        page_count: results.len(),
        failed_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(page: u32) -> PageRecognitionResult {
        PageRecognitionResult::failure(page, OcrError::OcrFailed("timeout".to_string()))
    }

    #[test]
    fn test_assemble_keeps_page_order() {
        let results = vec![
            PageRecognitionResult::success(1, "一"),
            PageRecognitionResult::success(2, "二"),
            PageRecognitionResult::success(3, "三"),
        ];
        let doc = assemble(&results);
        assert_eq!(doc.as_str(), "一\n二\n三");
        assert_eq!(doc.page_count(), 3);
        assert!(doc.failed_pages().is_empty());
    }

    #[test]
    fn test_assemble_skips_scattered_failures() {
        let results = vec![
            failed(1),
            PageRecognitionResult::success(2, "page two"),
            failed(3),
            PageRecognitionResult::success(4, "page four"),
            PageRecognitionResult::success(5, "page five"),
            failed(6),
        ];
        let doc = assemble(&results);
        let lines: Vec<&str> = doc.as_str().lines().collect();
        assert_eq!(lines, vec!["page two", "page four", "page five"]);
        assert_eq!(doc.page_count(), 6);
        assert_eq!(doc.failed_pages(), &[1, 3, 6]);
    }

    #[test]
    fn test_assemble_empty_input() {
        let doc = assemble(&[]);
        assert_eq!(doc.as_str(), "");
        assert!(doc.is_blank());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_assemble_all_failed() {
        let doc = assemble(&[failed(1), failed(2)]);
        assert!(doc.is_blank());
        assert_eq!(doc.failed_pages(), &[1, 2]);
    }

    #[test]
    fn test_assemble_keeps_empty_successful_page() {
        let results = vec![
            PageRecognitionResult::success(1, "head"),
            PageRecognitionResult::success(2, ""),
            PageRecognitionResult::success(3, "tail"),
        ];
        assert_eq!(assemble(&results).as_str(), "head\n\ntail");
    }
}
