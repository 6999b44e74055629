//! Min-max score fusion for hybrid ranking.
//!
//! The vector and lexical signals live on incompatible scales (squared
//! distances vs unbounded BM25 scores), so each is min-max normalized into
//! [0, 1] over the candidate pool before a weighted sum combines them:
//!
//! ```text
//! fused = alpha * norm(similarity) + (1 - alpha) * norm(bm25)
//! ```
//!
//! Distances are negated before normalization so that for both signals a
//! larger value means a better match.

use super::types::ChunkId;
use super::vector::VectorHit;
use crate::config::NORM_EPSILON;
use tracing::{debug, instrument};

/// A fused candidate, ranked by combined score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedHit {
    /// Candidate chunk
    pub chunk_id: ChunkId,
    /// Weighted combination of normalized signals, in [0, 1]
    pub score: f32,
}

/// Min-max normalizes scores into [0, 1] over the given slice.
///
/// The denominator is floored at [`NORM_EPSILON`]: a degenerate pool where
/// every score is identical normalizes to all zeros instead of dividing by
/// zero. Empty input yields empty output.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }

    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = (max - min).max(NORM_EPSILON);

    scores.iter().map(|&s| (s - min) / range).collect()
}

/// Fuses vector hits with their BM25 scores into a final top-`k` ranking.
///
/// `bm25` must hold one score per hit, in the same order as `vector_hits`
/// (the candidate pool order). Vector distances are negated into
/// similarities, both signals are min-max normalized over the pool, and
/// candidates are reordered by the weighted sum, descending. The sort is
/// stable, so candidates with equal fused scores keep their vector rank.
#[instrument(skip_all, fields(pool = vector_hits.len(), alpha, k))]
pub fn fuse(vector_hits: &[VectorHit], bm25: &[f32], alpha: f32, k: usize) -> Vec<FusedHit> {
    debug_assert_eq!(vector_hits.len(), bm25.len());

    let similarities: Vec<f32> = vector_hits.iter().map(|hit| -hit.distance).collect();
    let sim_norm = min_max_normalize(&similarities);
    let bm25_norm = min_max_normalize(bm25);

    let mut fused: Vec<FusedHit> = vector_hits
        .iter()
        .zip(sim_norm.iter().zip(&bm25_norm))
        .map(|(hit, (&sim, &lex))| FusedHit {
            chunk_id: hit.chunk_id,
            score: alpha * sim + (1.0 - alpha) * lex,
        })
        .collect();

    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(k);

    debug!(returned = fused.len(), "Fused candidate pool");
    fused
}
