//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod fetch;
pub mod output;
pub mod profiles;
pub mod quote;

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use jpquote_core::{QuotationEngine, QuoteConfig, RawDocument};

/// `~/.config/jpquote/config.json` on Linux.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jpquote")
        .join("config.json")
}

/// Explicit `--config` path, else the default file if present, else built-ins.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<QuoteConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let default = default_config_path();
            if !default.exists() {
                debug!("No config file at {}, using defaults", default.display());
                return Ok(QuoteConfig::default());
            }
            default
        }
    };

    debug!("Loading config from {}", path.display());
    QuoteConfig::from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))
}

pub fn build_engine(config_path: Option<&str>) -> anyhow::Result<QuotationEngine> {
    let config = load_config(config_path)?;
    Ok(QuotationEngine::from_config(&config)?)
}

/// Whether a path looks like a saved web page.
pub fn is_html_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_lowercase().as_str(), "html" | "htm"))
}

/// Read a document from a file, or from stdin when `input` is `-`.
pub fn read_document(input: &Path, html: bool, origin: Option<&str>) -> anyhow::Result<RawDocument> {
    let text = if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        text
    } else {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
        std::fs::read_to_string(input)?
    };

    let document = if html || is_html_path(input) {
        RawDocument::html(text)
    } else {
        RawDocument::ocr(text)
    };

    Ok(match origin {
        Some(url) => document.with_origin(url),
        None => document,
    })
}
