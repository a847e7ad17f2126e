//! Quote command - quote a single OCR text or HTML file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use jpquote_core::{QuotationEngine, Quotation, RawDocument};

use super::output::{OutputFormat, format_quotation};

/// Arguments for the quote command.
#[derive(Args)]
pub struct QuoteArgs {
    /// Input file with OCR text or HTML, or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Treat the input as an HTML page (implied by .html/.htm)
    #[arg(long)]
    html: bool,

    /// URL the document was captured from, used for profile detection
    #[arg(short, long)]
    url: Option<String>,

    /// Use this profile instead of detecting one
    #[arg(short, long)]
    profile: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: QuoteArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let engine = super::build_engine(config_path)?;
    let document = super::read_document(&args.input, args.html, args.url.as_deref())?;

    info!("Quoting {}", args.input.display());
    let quotation = quote_with(&engine, document, args.profile.as_deref())?;

    let output = format_quotation(&quotation, &engine.conversion().currency, args.format)?;
    write_output(&output, args.output.as_ref())?;

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Quote a document, optionally forcing a profile.
pub fn quote_with(
    engine: &QuotationEngine,
    document: RawDocument,
    profile: Option<&str>,
) -> anyhow::Result<Quotation> {
    let quotation = match profile {
        Some(id) => {
            let profile = engine
                .profiles()
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("Unknown profile: {}", id))?;
            let extraction = engine.extract_with(&document, profile)?;
            Quotation::new(extraction, engine.conversion(), document)
        }
        None => engine.quote(document)?,
    };
    Ok(quotation)
}

/// Print to stdout or write to a file.
pub fn write_output(output: &str, path: Option<&PathBuf>) -> anyhow::Result<()> {
    if let Some(output_path) = path {
        fs::write(output_path, output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }
    Ok(())
}
