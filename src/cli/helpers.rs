//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use tokiscan::llm::LlmClient;
use tokiscan::ocr::{create_backend, PdftoppmRasterizer};
use tokiscan::{Config, FactExtractor, RegistryPipeline};

/// Expand `~` in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    PathBuf::from(expanded)
}

/// Load config from `--config` if given, otherwise by discovery.
pub async fn load_config(config_path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match config_path {
        Some(path) => {
            let path = expand_path(path);
            Config::load_from_path(&path)
                .await
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => Config::load().await,
    };

    if let Some(ref source) = config.source_path {
        debug!("Using config file {}", source.display());
    }
    Ok(config)
}

/// Resolve and validate the PDF argument.
pub fn resolve_pdf(path: &Path) -> anyhow::Result<PathBuf> {
    let path = expand_path(path);
    if !path.is_file() {
        anyhow::bail!("PDF not found: {}", path.display());
    }
    Ok(path)
}

/// Wire the production collaborators from config.
pub fn build_pipeline(config: &Config) -> anyhow::Result<RegistryPipeline> {
    let rasterizer = Arc::new(PdftoppmRasterizer::new(config.ocr.dpi));
    let recognizer = create_backend(&config.ocr).context("Failed to set up OCR backend")?;
    let client = LlmClient::new(config.llm.clone()).context("Failed to set up LLM client")?;
    let extractor = FactExtractor::from_config(Arc::new(client), &config.llm);

    Ok(RegistryPipeline::new(rasterizer, recognizer, extractor)
        .with_page_concurrency(config.ocr.page_concurrency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(
            expand_path(Path::new("scans/ledger.pdf")),
            PathBuf::from("scans/ledger.pdf")
        );
    }

    #[test]
    fn test_resolve_missing_pdf() {
        let err = resolve_pdf(Path::new("/nonexistent/ledger.pdf")).unwrap_err();
        assert!(err.to_string().contains("PDF not found"));
    }

    #[test]
    fn test_build_pipeline_with_defaults() {
        assert!(build_pipeline(&Config::default()).is_ok());
    }
}
