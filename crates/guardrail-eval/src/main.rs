//! Guardrail Evaluation Tool
//!
//! Replays a benchmark question set through both retrieval modes against an
//! existing index and reports, per question and mode, whether the engine
//! answered or abstained and what evidence it ranked first. The engine is
//! loaded once and reused across the whole run.
//!
//! # Usage
//!
//! ```bash
//! # Replay the default question set
//! cargo run -p guardrail-eval --release -- --data-dir ./data
//!
//! # Custom questions, JSON report
//! cargo run -p guardrail-eval --release -- \
//!     --questions questions.json --data-dir ./data --json
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use guardrail_core::citations::SourceTable;
use guardrail_core::embedding::{Embedder, HashEmbedder};
use guardrail_core::search::{RetrievalEngine, SearchMode};
use guardrail_core::storage::RedbChunkStore;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

const DATABASE_FILENAME: &str = "chunks.redb";

/// Fallback question set covering the corpus domains, used when no
/// questions file is given.
const DEFAULT_QUESTIONS: &[&str] = &[
    "When is machine guarding required?",
    "What are the steps of a lockout tagout procedure?",
    "Who may operate a forklift?",
    "How often must fire extinguishers be inspected?",
    "What noise level requires hearing protection?",
    "What is the capital of France?",
];

#[derive(Parser, Debug)]
#[command(name = "guardrail-eval")]
#[command(about = "Replay benchmark questions through both retrieval modes")]
struct Args {
    /// Data directory containing chunks.redb (and optionally sources.json)
    #[arg(long)]
    data_dir: PathBuf,

    /// JSON file with an array of question strings
    #[arg(long)]
    questions: Option<PathBuf>,

    /// Citation table JSON file
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Number of contexts per question
    #[arg(short, long, default_value = "5")]
    k: usize,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct EvalReport {
    indexed_chunks: usize,
    k: usize,
    questions: Vec<QuestionResult>,
    summary: Vec<ModeSummary>,
}

#[derive(Debug, Serialize)]
struct QuestionResult {
    question: String,
    runs: Vec<ModeRun>,
}

#[derive(Debug, Serialize)]
struct ModeRun {
    mode: String,
    abstained: bool,
    contexts: usize,
    top_doc: Option<String>,
    top_score: Option<f32>,
    answer: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModeSummary {
    mode: String,
    answered: usize,
    abstained: usize,
}

fn load_questions(path: Option<&PathBuf>) -> Result<Vec<String>> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read questions: {}", path.display()))?;
            let questions: Vec<String> = serde_json::from_str(&json)
                .with_context(|| format!("Malformed questions file: {}", path.display()))?;
            if questions.is_empty() {
                return Err(anyhow!("Questions file is empty: {}", path.display()));
            }
            Ok(questions)
        }
        None => Ok(DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect()),
    }
}

async fn run_eval(args: &Args) -> Result<EvalReport> {
    let db_path = args.data_dir.join(DATABASE_FILENAME);
    if !db_path.exists() {
        return Err(anyhow!(
            "No index found at {}.\nRun `gr ingest <dir>` and `gr embed` first.",
            db_path.display()
        ));
    }

    let store = RedbChunkStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let source_table = match &args.sources {
        Some(path) => SourceTable::load(path)
            .with_context(|| format!("Failed to load sources: {}", path.display()))?,
        None => SourceTable::empty(),
    };

    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
    let engine = RetrievalEngine::load(store, embedder, source_table)
        .await
        .context("Failed to load retrieval engine")?;

    let questions = load_questions(args.questions.as_ref())?;
    let modes = [SearchMode::Baseline, SearchMode::Hybrid];

    let pb = ProgressBar::new((questions.len() * modes.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap(),
    );
    pb.set_message("Questions");

    let mut results = Vec::with_capacity(questions.len());
    let mut summaries: Vec<ModeSummary> = modes
        .iter()
        .map(|mode| ModeSummary {
            mode: mode.to_string(),
            answered: 0,
            abstained: 0,
        })
        .collect();

    for question in &questions {
        let mut runs = Vec::with_capacity(modes.len());
        for (mode_idx, &mode) in modes.iter().enumerate() {
            let envelope = engine
                .ask(question, args.k, mode)
                .await
                .map_err(|e| anyhow!("Retrieval failed for \"{}\": {}", question, e))?;

            if envelope.abstained {
                summaries[mode_idx].abstained += 1;
            } else {
                summaries[mode_idx].answered += 1;
            }

            runs.push(ModeRun {
                mode: mode.to_string(),
                abstained: envelope.abstained,
                contexts: envelope.contexts.len(),
                top_doc: envelope.contexts.first().map(|c| c.doc.clone()),
                top_score: envelope.contexts.first().map(|c| c.score),
                answer: envelope.answer,
            });
            pb.inc(1);
        }
        results.push(QuestionResult {
            question: question.clone(),
            runs,
        });
    }
    pb.finish();

    Ok(EvalReport {
        indexed_chunks: engine.indexed_chunks(),
        k: args.k,
        questions: results,
        summary: summaries,
    })
}

fn print_report(report: &EvalReport) {
    println!("\n{}", "=".repeat(80));
    println!("GUARDRAIL RETRIEVAL EVALUATION");
    println!("{}", "=".repeat(80));
    println!(
        "\nIndex: {} chunks, k={}, {} questions",
        report.indexed_chunks,
        report.k,
        report.questions.len()
    );

    for result in &report.questions {
        println!("\n{}", "-".repeat(70));
        println!("Q: {}", result.question);
        for run in &result.runs {
            let verdict = if run.abstained { "abstained" } else { "answered" };
            let evidence = match (&run.top_doc, run.top_score) {
                (Some(doc), Some(score)) => format!("{} ({:.3})", doc, score),
                _ => "-".to_string(),
            };
            println!(
                "  {:<9} {:<10} top: {:<40} contexts: {}",
                run.mode, verdict, evidence, run.contexts
            );
        }
    }

    println!("\n{}", "-".repeat(70));
    println!("SUMMARY");
    for summary in &report.summary {
        println!(
            "  {:<9} answered {:>3}  abstained {:>3}",
            summary.mode, summary.answered, summary.abstained
        );
    }
    println!("{}\n", "=".repeat(80));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let report = run_eval(&args).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
