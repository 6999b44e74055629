//! Ingestion pipeline: documents in, chunks and embeddings out.
//!
//! Two passes over the corpus:
//!
//! 1. [`ingest_dir`] clears the store, extracts text from every supported
//!    file in the source directory, chunks it, and persists the chunks.
//! 2. [`embed_all`] embeds every stored chunk and persists the vectors.
//!
//! Splitting the passes mirrors how the corpus is actually maintained: the
//! chunk pass is cheap and rerun freely, the embedding pass is the
//! expensive one. Ingestion always starts from a cleared store, so rerunning
//! the full pipeline over the same corpus reproduces the same state.

use crate::chunking::{chunk_words, ChunkParams};
use crate::embedding::Embedder;
use crate::error::IngestError;
use crate::search::types::{ChunkId, ChunkRecord};
use crate::storage::ChunkStore;
use lopdf::Document;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Extracts plain text from one source file format.
pub trait TextExtractor {
    /// Whether this extractor handles the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Extracts the file's full text.
    fn extract(&self, path: &Path) -> Result<String, IngestError>;
}

/// PDF text extraction via [lopdf](https://crates.io/crates/lopdf).
///
/// Extraction is page by page; a page that fails to decode is logged and
/// skipped so one corrupt content stream doesn't lose the whole document.
/// A PDF yielding no text at all (e.g. scanned images) is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
    }

    fn extract(&self, path: &Path) -> Result<String, IngestError> {
        let data = std::fs::read(path)?;
        let doc = Document::load_mem(&data)
            .map_err(|e| IngestError::Extraction(format!("failed to parse PDF: {}", e)))?;

        let mut all_text = String::new();
        for (page_num, _page_id) in doc.get_pages() {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) => {
                    if !all_text.is_empty() && !page_text.is_empty() {
                        all_text.push('\n');
                    }
                    all_text.push_str(&page_text);
                }
                Err(e) => {
                    debug!(page = page_num, error = %e, "Failed to extract page text");
                }
            }
        }

        if all_text.trim().is_empty() {
            return Err(IngestError::Extraction(
                "PDF contains no extractable text".to_string(),
            ));
        }
        Ok(all_text)
    }
}

/// Plain text and markdown extraction: the file contents verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md"))
    }

    fn extract(&self, path: &Path) -> Result<String, IngestError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// The default extractor set: PDF plus plain text.
pub fn default_extractors() -> Vec<Box<dyn TextExtractor>> {
    vec![Box::new(PdfExtractor), Box::new(PlainTextExtractor)]
}

/// Summary of one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Files successfully chunked
    pub files_ingested: usize,
    /// Files skipped (unsupported format or failed extraction)
    pub files_skipped: usize,
    /// Total chunks written to the store
    pub chunks_written: usize,
}

/// Chunks every supported file under `dir` into the store.
///
/// The store is cleared first: ingestion is a full rebuild, never an
/// incremental merge, so the store always reflects exactly one pass over
/// the corpus. Files are processed in sorted name order for reproducible
/// chunk ids. A file whose extraction fails is logged and skipped; the
/// pass only aborts on directory I/O or storage failures.
#[instrument(skip(store, extractors, params), fields(dir = %dir.as_ref().display()))]
pub async fn ingest_dir<S: ChunkStore, P: AsRef<Path>>(
    store: &S,
    dir: P,
    extractors: &[Box<dyn TextExtractor>],
    params: &ChunkParams,
) -> Result<IngestReport, IngestError> {
    store.clear().await?;

    let mut paths: Vec<_> = std::fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut report = IngestReport::default();
    let mut next_id = 1u64;
    for path in &paths {
        let Some(extractor) = extractors.iter().find(|e| e.supports(path)) else {
            debug!(file = %path.display(), "Unsupported file type, skipping");
            report.files_skipped += 1;
            continue;
        };

        let text = match extractor.extract(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Extraction failed, skipping file");
                report.files_skipped += 1;
                continue;
            }
        };

        let doc_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
            .to_string();

        let chunks = chunk_words(&text, params)?;
        let chunk_count = chunks.len();
        for chunk in chunks {
            let id = ChunkId::from_u64(next_id);
            next_id += 1;
            let record = ChunkRecord {
                id,
                doc_name: doc_name.clone(),
                ordinal: chunk.ordinal,
                text: chunk.text,
            };
            store.put_chunk(id, &record).await?;
        }

        debug!(file = %doc_name, chunks = chunk_count, "Ingested file");
        report.files_ingested += 1;
        report.chunks_written += chunk_count;
    }

    info!(
        files = report.files_ingested,
        skipped = report.files_skipped,
        chunks = report.chunks_written,
        "Ingestion pass complete"
    );
    Ok(report)
}

/// Embeds every stored chunk and persists the vectors.
///
/// Returns the number of embeddings written. Chunks are processed in id
/// order; rerunning overwrites existing embeddings, so switching embedders
/// only requires rerunning this pass.
#[instrument(skip_all)]
pub async fn embed_all<S: ChunkStore>(
    store: &S,
    embedder: &dyn Embedder,
) -> Result<usize, IngestError> {
    let chunks = store.iter_chunks().await?;
    if chunks.is_empty() {
        info!("No chunks to embed");
        return Ok(0);
    }

    let texts: Vec<String> = chunks.iter().map(|(_, record)| record.text.clone()).collect();
    let embeddings = embedder.embed(&texts)?;

    let mut written = 0;
    for ((id, _), embedding) in chunks.iter().zip(&embeddings) {
        store.put_embedding(*id, embedding).await?;
        written += 1;
    }

    info!(embeddings = written, dimension = embedder.dimension(), "Embedding pass complete");
    Ok(written)
}
