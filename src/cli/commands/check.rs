//! Tool and backend availability check.

use console::style;

use crate::cli::icons::warning;
use crate::config::Config;
use crate::llm::{build_structurer, LlmProvider};

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tools").bold());
    println!("{}", "-".repeat(50));
    for (tool, available) in config.extractor().check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("Structuring Backend").bold());
    println!("{}", "-".repeat(50));
    let llm = &config.llm;
    println!("  {:<15} {}", "Provider", llm.provider);
    println!("  {:<15} {}", "Endpoint", llm.effective_endpoint());
    println!("  {:<15} {}", "Model", llm.effective_model());

    let structurer = build_structurer(llm)?;
    let status = if structurer.test_connection().await {
        style("✓ reachable").green()
    } else {
        style("✗ unreachable").red()
    };
    println!("  {:<15} {}", "Connection", status);
    if llm.provider == LlmProvider::OpenAI && llm.api_key.is_none() {
        println!(
            "  {} {}",
            warning(),
            style("No API key: set OPENAI_API_KEY or LLM_API_KEY").dim()
        );
    }
    println!();
    Ok(())
}
