//! Configuration display.

use console::style;

use crate::cli::icons::arrow;
use crate::config::Config;

/// Print the effective configuration as TOML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match config.source_path {
        Some(ref path) => eprintln!("{} Loaded from {}", arrow(), path.display()),
        None => eprintln!(
            "{} {}",
            arrow(),
            style("No config file found; using defaults and environment").dim()
        ),
    }

    let rendered = toml::to_string_pretty(&config.redacted())?;
    println!("{}", rendered);
    Ok(())
}
