//! PDF-to-image conversion for OCR.
//!
//! Every page of a PDF is rendered with pdftoppm into a temporary directory
//! owned by [`RasterizedDocument`]. The directory and all page images are
//! removed when the document is dropped.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::model_utils::PDFTOPPM_NOT_FOUND;

/// Errors that abort rasterization of a whole document.
#[derive(Debug, Error)]
pub enum PageRasterizationError {
    #[error("PDF not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("pdftoppm failed on {}: {stderr}", .path.display())]
    Failed { path: PathBuf, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number.
    pub number: u32,
    pub path: PathBuf,
}

/// Page images of one PDF, backed by a temporary directory.
#[derive(Debug)]
pub struct RasterizedDocument {
    dir: TempDir,
    pages: Vec<PageImage>,
}

impl RasterizedDocument {
    pub fn new(dir: TempDir, pages: Vec<PageImage>) -> Self {
        Self { dir, pages }
    }

    /// Pages in page order.
    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    /// Directory holding the page images.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Converts a PDF into page images.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf_path: &Path)
        -> Result<RasterizedDocument, PageRasterizationError>;
}

/// Rasterizer backed by poppler's pdftoppm.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    dpi: u32,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(300)
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(
        &self,
        pdf_path: &Path,
    ) -> Result<RasterizedDocument, PageRasterizationError> {
        if !pdf_path.is_file() {
            return Err(PageRasterizationError::NotFound(pdf_path.to_path_buf()));
        }

        let temp_dir = TempDir::new()?;
        let dpi = self.dpi.to_string();

        let output = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi])
            .arg(pdf_path)
            .arg(temp_dir.path().join("page"))
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                return Err(PageRasterizationError::Failed {
                    path: pdf_path.to_path_buf(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PageRasterizationError::ToolNotFound(
                    PDFTOPPM_NOT_FOUND.to_string(),
                ));
            }
            Err(e) => return Err(PageRasterizationError::Io(e)),
        }

        let pages = find_page_images(temp_dir.path())?;
        debug!(
            "Rasterized {} at {} DPI into {} pages",
            pdf_path.display(),
            self.dpi,
            pages.len()
        );

        Ok(RasterizedDocument::new(temp_dir, pages))
    }
}

/// Collect the page images pdftoppm wrote into `dir`, ordered by page number.
///
/// pdftoppm names files like page-1.png, page-01.png or page-001.png; the
/// padding width depends on the total page count.
pub fn find_page_images(dir: &Path) -> std::io::Result<Vec<PageImage>> {
    let mut pages: Vec<PageImage> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let number = page_number(&path)?;
            Some(PageImage { number, path })
        })
        .collect();

    pages.sort_by_key(|page| page.number);
    Ok(pages)
}

fn page_number(path: &Path) -> Option<u32> {
    path.file_name()?
        .to_str()?
        .strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_images_empty() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_images(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_find_page_images_numeric_order() {
        let temp = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt"] {
            std::fs::write(temp.path().join(name), b"fake png").unwrap();
        }

        let pages = find_page_images(temp.path()).unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(pages[0].path, temp.path().join("page-01.png"));
    }

    #[test]
    fn test_page_number_with_3_digit_padding() {
        assert_eq!(page_number(Path::new("/tmp/page-007.png")), Some(7));
        assert_eq!(page_number(Path::new("/tmp/page-7.jpg")), None);
        assert_eq!(page_number(Path::new("/tmp/cover.png")), None);
    }

    #[test]
    fn test_rasterized_document_removes_dir_on_drop() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("page-1.png"), b"fake png").unwrap();
        let pages = find_page_images(temp.path()).unwrap();
        let document = RasterizedDocument::new(temp, pages);
        let dir = document.dir().to_path_buf();

        assert_eq!(document.len(), 1);
        assert!(dir.exists());
        drop(document);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_rasterize_missing_pdf() {
        let rasterizer = PdftoppmRasterizer::default();
        let err = rasterizer
            .rasterize(Path::new("/nonexistent/registry.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PageRasterizationError::NotFound(_)));
    }
}
