//! Fetch command - download a product page and quote it.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use jpquote_core::RawDocument;

use super::output::{OutputFormat, format_quotation};
use super::quote::{quote_with, write_output};

/// Desktop browser User-Agent; some shops serve nothing useful to bots.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const TIMEOUT: Duration = Duration::from_secs(10);

/// Arguments for the fetch command.
#[derive(Args)]
pub struct FetchArgs {
    /// Product page URL
    #[arg(required = true)]
    url: String,

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

pub async fn run(args: FetchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let engine = super::build_engine(config_path)?;

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(TIMEOUT)
        .build()?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} {bytes}")?);
    pb.set_message(format!("Fetching {}", args.url));

    let html = fetch_page(&client, &args.url, &pb).await;
    pb.finish_and_clear();
    let html = html?;

    info!("Fetched {} bytes from {}", html.len(), args.url);

    let document = RawDocument::html(html).with_origin(args.url.as_str());
    let quotation = quote_with(&engine, document, args.profile.as_deref())?;

    let output = format_quotation(&quotation, &engine.conversion().currency, args.format)?;
    write_output(&output, args.output.as_ref())?;

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// GET a page body as text. A non-success status is an error; there are no retries.
async fn fetch_page(client: &reqwest::Client, url: &str, pb: &ProgressBar) -> anyhow::Result<String> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {} from {}", response.status(), url);
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        pb.set_position(body.len() as u64);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
