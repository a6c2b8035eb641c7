//! Show what the backend would receive for a document.

use std::path::Path;

use console::style;

use crate::cli::icons::success;
use crate::config::Config;
use crate::models::RawDocument;

/// Extract and anonymize `file`, printing the sanitized text to stdout.
///
/// The file is read in place and never deleted.
pub async fn cmd_anonymize(config: &Config, file: &Path) -> anyhow::Result<()> {
    let document = RawDocument::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    let extracted = config.extractor().extract(&document).await?;
    let sanitized = config.anonymizer().anonymize(&extracted);

    println!("{}", sanitized.as_str());

    eprintln!(
        "\n{} {} characters, {} redactions",
        success(),
        extracted.char_len(),
        sanitized.total_redactions()
    );
    for (category, count) in sanitized.redaction_counts() {
        if *count > 0 {
            eprintln!("  {:<16} {}", style(category.placeholder()).cyan(), count);
        }
    }
    Ok(())
}
