//! Profiles command - inspect the source profile table.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use super::read_document;

/// Arguments for the profiles command.
#[derive(Args)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    command: ProfilesCommand,
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// List profiles in dispatch priority order
    List,

    /// Show which profile a document dispatches to
    Detect {
        /// Input file, or `-` for stdin
        input: PathBuf,

        /// Treat the input as an HTML page
        #[arg(long)]
        html: bool,

        /// URL the document was captured from
        #[arg(short, long)]
        url: Option<String>,
    },
}

pub async fn run(args: ProfilesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let engine = super::build_engine(config_path)?;

    match args.command {
        ProfilesCommand::List => {
            println!("{}", style("Source profiles").bold());
            println!();

            for (i, profile) in engine.profiles().iter().enumerate() {
                let detection = profile.detection();
                let hint = detection.source_hint().map(|h| h.as_str()).unwrap_or("any");
                let keywords = if detection.is_empty() {
                    "(fallback)".to_string()
                } else {
                    detection.keywords().join(", ")
                };

                println!(
                    "{:>2}. {:<16} {:<5} {}",
                    i + 1,
                    style(profile.id()).cyan(),
                    hint,
                    keywords
                );
            }
        }
        ProfilesCommand::Detect { input, html, url } => {
            let document = read_document(&input, html, url.as_deref())?;
            println!("{}", engine.dispatch(&document).id());
        }
    }

    Ok(())
}
