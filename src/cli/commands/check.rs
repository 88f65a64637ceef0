//! Tool and service availability check.

use console::style;

use tokiscan::llm::LlmClient;
use tokiscan::ocr::{check_binary, create_backend, PDFTOPPM_NOT_FOUND};
use tokiscan::Config;

/// Report whether each pipeline stage can run with the current config.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("tokiscan Status").bold());
    println!("{}", "-".repeat(50));

    if let Some(ref path) = config.source_path {
        println!("  {:<15} {}", "Config", path.display());
    } else {
        println!("  {:<15} {}", "Config", style("defaults (no file found)").dim());
    }

    println!("\n{}", style("Rasterizer:").cyan());
    print_status("pdftoppm", check_binary("pdftoppm"), PDFTOPPM_NOT_FOUND);

    println!("\n{}", style("OCR Backend:").cyan());
    match create_backend(&config.ocr) {
        Ok(backend) => print_status(
            backend.backend_type().as_str(),
            backend.is_available(),
            &backend.availability_hint(),
        ),
        Err(e) => print_status(config.ocr.backend.as_str(), false, &e.to_string()),
    }

    println!("\n{}", style("LLM Service:").cyan());
    let client = LlmClient::new(config.llm.clone())?;
    let label = format!(
        "{} ({})",
        client.config().provider_name(),
        client.config().model
    );
    let available = client.is_available().await;
    print_status(&label, available, &client.config().availability_hint());

    println!();
    Ok(())
}

fn print_status(name: &str, available: bool, hint: &str) {
    let status = if available {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", name, status);
    if !available && !hint.is_empty() {
        println!("                  {}", style(hint).dim());
    }
}
