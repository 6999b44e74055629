//! BM25 lexical scoring over a candidate pool.
//!
//! Wraps the [`bm25`](https://crates.io/crates/bm25) crate. Unlike a
//! corpus-wide keyword index, the engine here is built per query over only
//! the candidate chunks the vector index returned: document frequencies are
//! computed within the pool, so the lexical signal measures how well each
//! candidate matches the query relative to its competitors.
//!
//! # Algorithm
//!
//! BM25 scores documents based on:
//! - **Term Frequency (TF)**: How often query terms appear in the candidate
//! - **Inverse Document Frequency (IDF)**: Rarity of terms across the pool
//! - **Document Length**: Normalized to avoid bias toward longer candidates

use bm25::{Document, Language, SearchEngineBuilder};
use tracing::instrument;

/// Scores each candidate text against the query with BM25.
///
/// Returns one score per candidate, in input order. Candidates that match
/// no query term score 0.0; an empty pool or a query with no indexable
/// terms yields all zeros. Scores are raw BM25 values (unbounded above),
/// intended for min-max normalization by the fusion step.
#[instrument(skip_all, fields(candidates = texts.len()))]
pub fn bm25_scores(query: &str, texts: &[String]) -> Vec<f32> {
    if texts.is_empty() {
        return Vec::new();
    }

    // Positional ids keep the scatter back into input order trivial.
    let documents: Vec<Document<u32>> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Document {
            id: i as u32,
            contents: text.clone(),
        })
        .collect();

    let engine = SearchEngineBuilder::<u32>::with_documents(Language::English, documents).build();

    let mut scores = vec![0.0f32; texts.len()];
    for result in engine.search(query, texts.len()) {
        scores[result.document.id as usize] = result.score;
    }
    scores
}
