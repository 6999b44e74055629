//! Ask command implementation.
//!
//! Loads the retrieval engine from the existing database and answers one
//! question.

use crate::config;
use anyhow::{anyhow, Context, Result};
use guardrail_core::citations::SourceTable;
use guardrail_core::embedding::{Embedder, HashEmbedder};
use guardrail_core::search::{AnswerEnvelope, RetrievalEngine, SearchMode};
use guardrail_core::storage::RedbChunkStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Answers a question against the existing index.
///
/// Opens the chunk database, builds the vector index from the stored
/// embeddings, loads the citation table if one is configured, and runs the
/// requested retrieval mode.
pub async fn execute_ask(
    question: &str,
    k: usize,
    mode: SearchMode,
    data_dir: Option<&PathBuf>,
    sources: Option<&PathBuf>,
) -> Result<AnswerEnvelope> {
    let db_path = config::database_path(data_dir)?;
    if !db_path.exists() {
        return Err(anyhow!(
            "No index found at {}.\nRun `gr ingest <dir>` and `gr embed` first.",
            db_path.display()
        ));
    }

    info!("Opening database: {}", db_path.display());
    let store = RedbChunkStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let source_table = match config::sources_path(sources, data_dir)? {
        Some(path) => {
            info!("Loading citation table: {}", path.display());
            SourceTable::load(&path)
                .with_context(|| format!("Failed to load sources: {}", path.display()))?
        }
        None => SourceTable::empty(),
    };

    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
    let engine = RetrievalEngine::load(store, embedder, source_table)
        .await
        .context("Failed to load retrieval engine")?;

    if engine.indexed_chunks() == 0 {
        return Err(anyhow!(
            "Index is empty.\nRun `gr embed` after ingesting documents."
        ));
    }

    info!("Answering: \"{}\" (mode: {}, k: {})", question, mode, k);
    let envelope = engine
        .ask(question, k, mode)
        .await
        .map_err(|e| anyhow!("Retrieval failed: {}", e))?;

    Ok(envelope)
}
