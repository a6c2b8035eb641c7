//! Full document analysis command.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::json;

use crate::cli::icons::{arrow, error, success};
use crate::config::Config;
use crate::llm::{build_structurer, LlmConfig, LlmProvider};
use crate::models::AnalysisResult;
use crate::pipeline::{ErrorReport, Pipeline};
use crate::upload::stage_upload;

#[derive(Serialize)]
struct SuccessEnvelope<'a> {
    success: bool,
    data: &'a AnalysisResult,
    filename: &'a str,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    success: bool,
    error: ErrorReport,
    filename: &'a str,
    timestamp: DateTime<Utc>,
}

/// Apply command-line backend overrides on top of the loaded config.
fn llm_overrides(base: &LlmConfig, provider: Option<LlmProvider>, model: Option<&str>) -> LlmConfig {
    llm_overrides_with(base, provider, model, |key| std::env::var(key).ok())
}

fn llm_overrides_with<F>(
    base: &LlmConfig,
    provider: Option<LlmProvider>,
    model: Option<&str>,
    lookup: F,
) -> LlmConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut llm = base.clone();
    if let Some(provider) = provider {
        if provider != llm.provider {
            // Endpoint, model and key belong to the configured provider
            llm.endpoint = None;
            llm.model = None;
            if provider == LlmProvider::Ollama {
                llm.api_key = None;
            }
            llm.provider = provider;
            llm = llm.with_provider_overrides(lookup);
        }
    }
    if let Some(model) = model {
        llm.model = Some(model.to_string());
    }
    llm
}

fn spinner(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Stage, analyze and report one document.
pub async fn cmd_analyze(
    config: &Config,
    file: &Path,
    json: bool,
    provider: Option<LlmProvider>,
    model: Option<&str>,
) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    let staged = match stage_upload(file, &config.upload_policy()).await {
        Ok(path) => path,
        Err(e) if json => {
            let envelope = json!({
                "success": false,
                "error": { "kind": "UploadRejected", "stage": "received", "message": e.to_string() },
                "filename": filename,
                "timestamp": Utc::now(),
            });
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            std::process::exit(1);
        }
        Err(e) => anyhow::bail!("{}", e),
    };

    let llm = llm_overrides(&config.llm, provider, model);
    let structurer = match build_structurer(&llm) {
        Ok(s) => s,
        Err(e) => {
            // The pipeline never ran, so the staged copy is ours to remove
            let _ = tokio::fs::remove_file(&staged).await;
            return Err(e.into());
        }
    };
    let pipeline = Pipeline::new(config.extractor(), config.anonymizer(), structurer)
        .with_timeout(Duration::from_secs(llm.timeout_secs));

    let pb = spinner(json);
    pb.set_message(format!(
        "Analyzing {} with {} ({})...",
        filename,
        llm.provider,
        pipeline.structurer().model_id()
    ));
    let outcome = pipeline.analyze(&staged).await;
    pb.finish_and_clear();

    match outcome {
        Ok(result) => {
            if json {
                let envelope = SuccessEnvelope {
                    success: true,
                    data: &result,
                    filename: &filename,
                    timestamp: Utc::now(),
                };
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                print_report(&filename, &result);
            }
            Ok(())
        }
        Err(e) => {
            if json {
                let envelope = FailureEnvelope {
                    success: false,
                    error: e.report(),
                    filename: &filename,
                    timestamp: Utc::now(),
                };
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                eprintln!("{} {} [{}]", error(), e, style(e.kind()).dim());
            }
            std::process::exit(1);
        }
    }
}

fn print_report(filename: &str, result: &AnalysisResult) {
    println!("\n{} {}", success(), style(format!("Analysis of {}", filename)).bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Summary:").cyan());
    println!("{}", result.summary);

    println!("\n{}", style("Key points:").cyan());
    for point in &result.key_points {
        println!("  {} {}", style("•").dim(), point);
    }

    println!("\n{}", style("Suggested actions:").cyan());
    for (i, suggestion) in result.suggestions.iter().enumerate() {
        println!("  {}. {}", i + 1, suggestion);
    }

    println!(
        "\n  {} {} characters analyzed by {} at {}",
        arrow(),
        result.metadata.text_length,
        result.metadata.model,
        result.metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
