//! Extraction commands (full pipeline and OCR only).

use std::path::Path;

use console::style;

use tokiscan::{Config, ExtractionResult};

use crate::cli::helpers::{build_pipeline, resolve_pdf};

/// Run the full pipeline on one PDF and print the facts.
pub async fn cmd_extract(config: &Config, pdf: &Path, json: bool) -> anyhow::Result<()> {
    let pdf = resolve_pdf(pdf)?;
    let pipeline = build_pipeline(config)?;

    let result = pipeline.run(&pdf).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_result(&result));
    }
    Ok(())
}

/// Rasterize and OCR one PDF and print the assembled text.
pub async fn cmd_ocr(config: &Config, pdf: &Path) -> anyhow::Result<()> {
    let pdf = resolve_pdf(pdf)?;
    let pipeline = build_pipeline(config)?;

    let document = pipeline.recognize_pdf(&pdf).await?;

    if !document.failed_pages().is_empty() {
        eprintln!(
            "{} OCR failed on page(s) {:?} of {}",
            style("!").yellow(),
            document.failed_pages(),
            document.page_count()
        );
    }
    println!("{}", document);
    Ok(())
}

fn render_result(result: &ExtractionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", style("■ 登記所名:").bold()));
    out.push_str(&format!("{}\n", result.registry_office));
    out.push('\n');
    out.push_str(&format!("{}\n", style("■ 住所一覧:").bold()));
    for address in &result.addresses {
        out.push_str(&format!("{}\n", address));
    }
    out
}
