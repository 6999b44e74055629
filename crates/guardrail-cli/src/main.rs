//! Guardrail CLI - question answering over industrial-safety documents.
//!
//! # Usage
//!
//! ```bash
//! # Build the corpus
//! gr ingest ./docs
//! gr embed
//!
//! # Ask questions
//! gr ask "when is machine guarding required"
//! gr ask "forklift training rules" -k 3 --mode baseline
//! gr ask "lockout tagout steps" --json
//!
//! # Show help
//! gr --help
//! ```

mod ask;
mod config;
mod output;
mod pipeline;

use anyhow::Result;
use clap::{Parser, Subcommand};
use guardrail_core::search::SearchMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Guardrail safety document Q&A.
///
/// Ingests a directory of safety documents, indexes them, and answers
/// natural-language questions with cited extractive snippets. Abstains
/// when no passage is confident enough.
#[derive(Parser)]
#[command(name = "gr", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Custom data directory (default: platform standard location)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk every supported document in a directory into the database
    Ingest {
        /// Directory of source documents (.pdf, .txt, .md)
        dir: PathBuf,
    },
    /// Embed all stored chunks
    Embed,
    /// Answer a question against the index
    Ask {
        /// The question to answer
        question: String,

        /// Number of contexts to retrieve
        #[arg(short, long, default_value = "5")]
        k: usize,

        /// Retrieval mode: baseline or hybrid
        #[arg(long, default_value = "hybrid")]
        mode: SearchMode,

        /// Citation table JSON file (default: sources.json in the data dir)
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Output the answer envelope as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &cli.command {
        Command::Ingest { dir } => {
            let report = pipeline::run_ingest(dir, cli.data_dir.as_ref()).await?;
            println!(
                "Ingested {} file{} ({} skipped), {} chunks written.",
                report.files_ingested,
                if report.files_ingested == 1 { "" } else { "s" },
                report.files_skipped,
                report.chunks_written
            );
            println!("Run `gr embed` to build the index.");
        }
        Command::Embed => {
            let written = pipeline::run_embed(cli.data_dir.as_ref()).await?;
            println!("Embedded {} chunks.", written);
        }
        Command::Ask {
            question,
            k,
            mode,
            sources,
            json,
        } => {
            let envelope = ask::execute_ask(
                question,
                *k,
                *mode,
                cli.data_dir.as_ref(),
                sources.as_ref(),
            )
            .await?;

            let rendered = if *json {
                output::format_json(question, &envelope)
            } else {
                output::format_human(question, &envelope)
            };
            println!("{}", rendered);
        }
    }

    Ok(())
}
