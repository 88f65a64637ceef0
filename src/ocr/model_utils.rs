//! Shared utilities for OCR backends.

use std::time::Instant;

use super::backend::{OcrBackendType, OcrResult};

pub const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";
pub const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Build an `OcrResult` with the elapsed time since `start`.
pub fn build_ocr_result(
    text: String,
    backend: OcrBackendType,
    model: Option<String>,
    start: Instant,
) -> OcrResult {
    OcrResult {
        text,
        backend,
        model,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }
}
