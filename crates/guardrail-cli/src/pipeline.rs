//! Ingestion commands: chunk the corpus and embed the chunks.

use crate::config;
use anyhow::{anyhow, Context, Result};
use guardrail_core::chunking::ChunkParams;
use guardrail_core::embedding::HashEmbedder;
use guardrail_core::ingest::{default_extractors, embed_all, ingest_dir, IngestReport};
use guardrail_core::storage::RedbChunkStore;
use std::path::PathBuf;
use tracing::info;

/// Runs the chunking pass: extract and chunk every supported file in
/// `dir` into the database, replacing any previous corpus.
pub async fn run_ingest(dir: &PathBuf, data_dir: Option<&PathBuf>) -> Result<IngestReport> {
    if !dir.is_dir() {
        return Err(anyhow!("Not a directory: {}", dir.display()));
    }

    let db_path = config::database_path(data_dir)?;
    info!("Opening database: {}", db_path.display());
    let store = RedbChunkStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let report = ingest_dir(&store, dir, &default_extractors(), &ChunkParams::default())
        .await
        .context("Ingestion failed")?;

    Ok(report)
}

/// Runs the embedding pass over every stored chunk.
///
/// Returns the number of embeddings written.
pub async fn run_embed(data_dir: Option<&PathBuf>) -> Result<usize> {
    let db_path = config::database_path(data_dir)?;
    if !db_path.exists() {
        return Err(anyhow!(
            "No database found at {}.\nRun `gr ingest <dir>` first.",
            db_path.display()
        ));
    }

    let store = RedbChunkStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let embedder = HashEmbedder::default();
    let written = embed_all(&store, &embedder)
        .await
        .context("Embedding pass failed")?;

    if written == 0 {
        return Err(anyhow!("No chunks to embed. Run `gr ingest <dir>` first."));
    }
    Ok(written)
}
