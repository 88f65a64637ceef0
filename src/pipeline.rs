//! End-to-end extraction: PDF → page images → page text → registry facts.
//!
//! Only rasterization failures abort a run. A page that fails OCR is skipped,
//! and a query that fails leaves its field empty while the other query still
//! completes.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::{normalize_addresses, ExtractionResult, FactExtractor};
use crate::ocr::{
    assemble, DocumentText, OcrBackend, PageImage, PageRasterizationError, PageRasterizer,
    PageRecognitionResult,
};

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to rasterize PDF: {0}")]
    Rasterization(#[from] PageRasterizationError),
}

/// Registry document pipeline with injected collaborators.
pub struct RegistryPipeline {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn OcrBackend>,
    extractor: FactExtractor,
    page_concurrency: usize,
}

impl RegistryPipeline {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        recognizer: Arc<dyn OcrBackend>,
        extractor: FactExtractor,
    ) -> Self {
        Self {
            rasterizer,
            recognizer,
            extractor,
            page_concurrency: 1,
        }
    }

    /// Recognize up to `n` pages at once. Output order is unaffected.
    pub fn with_page_concurrency(mut self, n: usize) -> Self {
        self.page_concurrency = n.max(1);
        self
    }

    /// Run the whole pipeline on one PDF.
    pub async fn run(&self, pdf_path: &Path) -> Result<ExtractionResult, PipelineError> {
        let document = self.recognize_pdf(pdf_path).await?;
        Ok(self.extract_facts(&document).await)
    }

    /// Rasterize and OCR a PDF into one document text.
    ///
    /// Page images are deleted before this returns.
    pub async fn recognize_pdf(&self, pdf_path: &Path) -> Result<DocumentText, PipelineError> {
        info!("Rasterizing {}", pdf_path.display());
        let rasterized = self.rasterizer.rasterize(pdf_path).await?;

        let results = self.recognize_pages(rasterized.pages()).await;
        let document = assemble(&results);

        info!(
            "Recognized {} of {} pages",
            document.page_count() - document.failed_pages().len(),
            document.page_count()
        );
        Ok(document)
    }

    async fn recognize_pages(&self, pages: &[PageImage]) -> Vec<PageRecognitionResult> {
        let total = pages.len();
        let recognizer = &self.recognizer;

        stream::iter(pages)
            .map(|page| async move {
                info!("OCR page {}/{}", page.number, total);
                let outcome = recognizer.ocr_image(&page.path).await.map(|result| {
                    debug!(
                        "Page {} recognized by {} in {}ms",
                        page.number, result.backend, result.processing_time_ms
                    );
                    result.text
                });
                PageRecognitionResult {
                    page: page.number,
                    outcome,
                }
            })
            .buffered(self.page_concurrency)
            .collect()
            .await
    }

    /// Ask both extraction queries and normalize the answers.
    ///
    /// Failures degrade the affected field to empty; nothing here errors.
    pub async fn extract_facts(&self, document: &DocumentText) -> ExtractionResult {
        if document.is_blank() {
            info!("Document text is empty, nothing to extract");
            return ExtractionResult::default();
        }

        let (office, raw_addresses) = tokio::join!(
            self.extractor.extract_registry_office(document),
            self.extractor.extract_addresses(document),
        );

        let registry_office = office.unwrap_or_else(|e| {
            warn!("{}", e);
            String::new()
        });

        let raw_addresses = raw_addresses.unwrap_or_else(|e| {
            warn!("{}", e);
            Vec::new()
        });
        let addresses = normalize_addresses(&raw_addresses);
        debug!(
            "Kept {} of {} raw address lines",
            addresses.len(),
            raw_addresses.len()
        );

        ExtractionResult {
            registry_office,
            addresses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionService, LlmError, DEFAULT_ADDRESSES_PROMPT};
    use crate::ocr::{OcrBackendType, OcrError, RasterizedDocument};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes `pages` fake page images and remembers where.
    struct FakeRasterizer {
        pages: usize,
        dir: Mutex<Option<PathBuf>>,
    }

    impl FakeRasterizer {
        fn with_pages(pages: usize) -> Arc<Self> {
            Arc::new(Self {
                pages,
                dir: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl PageRasterizer for FakeRasterizer {
        async fn rasterize(
            &self,
            _pdf_path: &Path,
        ) -> Result<RasterizedDocument, PageRasterizationError> {
            let dir = TempDir::new()?;
            let mut pages = Vec::new();
            for number in 1..=self.pages as u32 {
                let path = dir.path().join(format!("page-{}.png", number));
                std::fs::write(&path, format!("page {}", number))?;
                pages.push(PageImage { number, path });
            }
            *self.dir.lock().unwrap() = Some(dir.path().to_path_buf());
            Ok(RasterizedDocument::new(dir, pages))
        }
    }

    struct BrokenRasterizer;

    #[async_trait]
    impl PageRasterizer for BrokenRasterizer {
        async fn rasterize(
            &self,
            pdf_path: &Path,
        ) -> Result<RasterizedDocument, PageRasterizationError> {
            Err(PageRasterizationError::Failed {
                path: pdf_path.to_path_buf(),
                stderr: "Syntax Error: Couldn't find trailer dictionary".to_string(),
            })
        }
    }

    /// Recognizes "page N" image contents as `texts[N-1]`; `None` fails.
    struct ScriptedOcr {
        texts: Vec<Option<&'static str>>,
    }

    #[async_trait]
    impl OcrBackend for ScriptedOcr {
        fn backend_type(&self) -> OcrBackendType {
            OcrBackendType::Tesseract
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        async fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
            let content = std::fs::read_to_string(image_path)?;
            let number: usize = content.trim_start_matches("page ").parse().unwrap();
            self.texts[number - 1]
                .map(str::to_string)
                .ok_or_else(|| OcrError::OcrFailed(format!("unreadable page {}", number)))
        }
    }

    /// Answers by query type, told apart by the prompt template.
    struct RegistryLlm {
        office: Result<&'static str, ()>,
        addresses: Result<&'static str, ()>,
        calls: Mutex<usize>,
    }

    impl RegistryLlm {
        fn new(office: Result<&'static str, ()>, addresses: Result<&'static str, ()>) -> Arc<Self> {
            Arc::new(Self {
                office,
                addresses,
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionService for RegistryLlm {
        async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            let answer = if is_addresses_prompt(prompt) {
                self.addresses
            } else {
                self.office
            };
            answer
                .map(str::to_string)
                .map_err(|_| LlmError::Connection("connection refused".to_string()))
        }
    }

    fn is_addresses_prompt(prompt: &str) -> bool {
        let header = DEFAULT_ADDRESSES_PROMPT.split("{content}").next().unwrap();
        prompt.starts_with(header)
    }

    fn pipeline(
        rasterizer: Arc<dyn PageRasterizer>,
        texts: Vec<Option<&'static str>>,
        llm: Arc<RegistryLlm>,
    ) -> RegistryPipeline {
        RegistryPipeline::new(
            rasterizer,
            Arc::new(ScriptedOcr { texts }),
            FactExtractor::new(llm),
        )
    }

    #[tokio::test]
    async fn test_second_page_failure_keeps_first_page_facts() {
        let llm = RegistryLlm::new(
            Ok("大津地方法務局東近江支局"),
            Ok("1. 東近江市佐野町801 外2\n2. 東近江市佐野町801"),
        );
        let pipeline = pipeline(
            FakeRasterizer::with_pages(2),
            vec![Some("大津地方法務局東近江支局\n所有権移転相続・法人合併 東近江市佐野町801 外2"), None],
            llm,
        );

        let document = pipeline.recognize_pdf(Path::new("ledger.pdf")).await.unwrap();
        assert_eq!(document.failed_pages(), &[2]);
        assert!(document.as_str().starts_with("大津地方法務局東近江支局"));

        let result = pipeline.extract_facts(&document).await;
        assert_eq!(result.registry_office, "大津地方法務局東近江支局");
        assert_eq!(result.addresses, vec!["東近江市佐野町801", "東近江市佐野町801"]);
    }

    #[tokio::test]
    async fn test_all_pages_failed_yields_empty_result() {
        let llm = RegistryLlm::new(Ok("大阪法務局"), Ok("大阪市北区梅田1"));
        let pipeline = pipeline(FakeRasterizer::with_pages(3), vec![None, None, None], llm.clone());

        let result = pipeline.run(Path::new("ledger.pdf")).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(*llm.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_pages_yields_empty_result() {
        let llm = RegistryLlm::new(Ok("大阪法務局"), Ok(""));
        let pipeline = pipeline(FakeRasterizer::with_pages(0), vec![], llm);

        let result = pipeline.run(Path::new("empty.pdf")).await.unwrap();
        assert_eq!(result, ExtractionResult::default());
    }

    #[tokio::test]
    async fn test_failed_query_does_not_block_sibling() {
        let text = vec![Some("大阪法務局\n所有権移転相続法人合併 堺市堺区南瓦町3")];

        let office_down = pipeline(
            FakeRasterizer::with_pages(1),
            text.clone(),
            RegistryLlm::new(Err(()), Ok("堺市堺区南瓦町3")),
        );
        let result = office_down.run(Path::new("a.pdf")).await.unwrap();
        assert_eq!(result.registry_office, "");
        assert_eq!(result.addresses, vec!["堺市堺区南瓦町3"]);

        let addresses_down = pipeline(
            FakeRasterizer::with_pages(1),
            text,
            RegistryLlm::new(Ok("大阪法務局"), Err(())),
        );
        let result = addresses_down.run(Path::new("a.pdf")).await.unwrap();
        assert_eq!(result.registry_office, "大阪法務局");
        assert!(result.addresses.is_empty());
    }

    #[tokio::test]
    async fn test_rasterization_failure_is_fatal() {
        let pipeline = pipeline(
            Arc::new(BrokenRasterizer),
            vec![],
            RegistryLlm::new(Ok("大阪法務局"), Ok("")),
        );
        let err = pipeline.run(Path::new("corrupt.pdf")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Rasterization(PageRasterizationError::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn test_page_images_are_removed_after_run() {
        let rasterizer = FakeRasterizer::with_pages(2);
        let pipeline = pipeline(
            rasterizer.clone(),
            vec![Some("大阪法務局"), None],
            RegistryLlm::new(Ok("大阪法務局"), Ok("")),
        );

        pipeline.run(Path::new("ledger.pdf")).await.unwrap();

        let dir = rasterizer.dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_concurrent_pages_keep_order() {
        let pipeline = pipeline(
            FakeRasterizer::with_pages(5),
            vec![Some("一"), Some("二"), None, Some("四"), Some("五")],
            RegistryLlm::new(Ok(""), Ok("")),
        )
        .with_page_concurrency(4);

        let document = pipeline.recognize_pdf(Path::new("ledger.pdf")).await.unwrap();
        assert_eq!(document.as_str(), "一\n二\n四\n五");
        assert_eq!(document.page_count(), 5);
    }
}
