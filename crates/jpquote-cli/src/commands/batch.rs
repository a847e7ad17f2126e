//! Batch command - quote many files concurrently.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::StreamExt;
use futures_util::stream;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use jpquote_core::{QuotationEngine, Quotation};

use super::output::{CSV_HEADER, OutputFormat, QuoteRecord, csv_row, format_quotation};
use super::read_document;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of quoting a single file.
struct FileResult {
    path: PathBuf,
    quotation: Option<Quotation>,
    error: Option<String>,
    processing_time_ms: u64,
}

fn is_document(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    path.is_file() && matches!(ext.to_lowercase().as_str(), "txt" | "text" | "html" | "htm")
}

fn quote_file(engine: &QuotationEngine, path: PathBuf) -> FileResult {
    let start = Instant::now();
    let result = read_document(&path, false, None)
        .and_then(|document| Ok(engine.quote(document)?));
    let processing_time_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(quotation) => FileResult {
            path,
            quotation: Some(quotation),
            error: None,
            processing_time_ms,
        },
        Err(e) => FileResult {
            path,
            quotation: None,
            error: Some(e.to_string()),
            processing_time_ms,
        },
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    if args.jobs == 0 {
        anyhow::bail!("--jobs must be at least 1");
    }

    let engine = Arc::new(super::build_engine(config_path)?);
    let currency = engine.conversion().currency.clone();

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_document(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to quote", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Quoting is CPU-bound; each file runs on the blocking pool, at most
    // `jobs` at a time, and results come back in input order.
    let mut pending = stream::iter(files)
        .map(|path| {
            let engine = Arc::clone(&engine);
            tokio::task::spawn_blocking(move || quote_file(&engine, path))
        })
        .buffered(args.jobs);

    let mut results = Vec::new();

    while let Some(joined) = pending.next().await {
        let result = joined?;
        overall_pb.inc(1);

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to quote {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to quote {}: {}", result.path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Quoting failed for {}: {}", result.path.display(), error_msg);
            }
        }

        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.quotation.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            let Some(quotation) = &result.quotation else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("quotation");

            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));
            fs::write(&output_path, format_quotation(quotation, &currency, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results, &currency)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Quoted {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult], currency: &str) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend(CSV_HEADER);
    header.extend(["processing_time_ms", "error"]);
    wtr.write_record(&header)?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let time = result.processing_time_ms.to_string();

        let mut row = vec![filename.to_string()];
        match &result.quotation {
            Some(quotation) => {
                row.push("success".to_string());
                row.extend(csv_row(&QuoteRecord::new(quotation, currency)));
                row.extend([time, String::new()]);
            }
            None => {
                row.push("error".to_string());
                row.extend(std::iter::repeat_n(String::new(), CSV_HEADER.len()));
                row.extend([time, result.error.clone().unwrap_or_default()]);
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
