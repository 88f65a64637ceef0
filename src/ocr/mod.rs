//! Page rasterization, OCR and document text assembly.
//!
//! A scanned PDF is rendered page by page with pdftoppm, each page image is
//! recognized by an OCR backend, and the page texts are joined in page order.
//!
//! ## OCR Backends
//!
//! - **Tesseract**: local OCR, CPU-based (default, needs `jpn` traineddata)
//! - **Google Vision**: cloud document text detection (GOOGLE_VISION_API_KEY)

mod assembler;
mod backend;
mod model_utils;
mod pdf_utils;
mod tesseract;
mod vision;

use std::sync::Arc;

pub use assembler::{assemble, DocumentText, PageRecognitionResult};
pub use backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError, OcrResult};
pub use model_utils::{check_binary, PDFTOPPM_NOT_FOUND, TESSERACT_NOT_FOUND};
pub use pdf_utils::{
    find_page_images, PageImage, PageRasterizationError, PageRasterizer, PdftoppmRasterizer,
    RasterizedDocument,
};
pub use tesseract::TesseractBackend;
pub use vision::VisionBackend;

/// Create the OCR backend selected in the configuration.
pub fn create_backend(config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    let backend: Arc<dyn OcrBackend> = match config.backend {
        OcrBackendType::Tesseract => Arc::new(TesseractBackend::from_config(config)),
        OcrBackendType::Vision => Arc::new(VisionBackend::from_config(config)?),
    };
    Ok(backend)
}
