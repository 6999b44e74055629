//! Exact vector similarity search.
//!
//! A flat index over dense embeddings: queries are scored against every row
//! with squared Euclidean distance and ranked ascending. Exact scan keeps
//! results fully deterministic, which both retrieval idempotence and the
//! evaluation harness depend on; at corpus sizes of a few thousand chunks
//! the linear pass is not the bottleneck.
//!
//! # Usage
//!
//! ```ignore
//! use guardrail_core::search::vector::VectorIndex;
//!
//! let index = VectorIndex::build(ids, embeddings, 384)?;
//! let hits = index.search(&query_embedding, 5)?;
//! ```

use super::types::{validate_dimension, ChunkId, SearchError};
use tracing::{debug, instrument};

/// A vector hit: chunk id plus its squared-Euclidean distance to the query.
///
/// Lower distance means more similar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit {
    /// Chunk whose embedding produced this hit
    pub chunk_id: ChunkId,
    /// Squared Euclidean distance to the query (>= 0)
    pub distance: f32,
}

/// Flat exact-search index over fixed-dimension embeddings.
///
/// Row order is fixed at build time; ties in distance are broken by row
/// order, so identical inputs always rank identically.
pub struct VectorIndex {
    ids: Vec<ChunkId>,
    embeddings: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Creates an empty index with the given dimension.
    ///
    /// Searches against an empty index return no hits.
    pub fn empty(dimension: usize) -> Self {
        Self {
            ids: Vec::new(),
            embeddings: Vec::new(),
            dimension,
        }
    }

    /// Builds an index from parallel id and embedding lists.
    ///
    /// Every embedding must have exactly `dimension` components, and the two
    /// lists must have equal length.
    #[instrument(skip_all, fields(rows = ids.len(), dimension))]
    pub fn build(
        ids: Vec<ChunkId>,
        embeddings: Vec<Vec<f32>>,
        dimension: usize,
    ) -> Result<Self, SearchError> {
        if ids.len() != embeddings.len() {
            return Err(SearchError::IndexError(format!(
                "id/embedding length mismatch: {} ids, {} embeddings",
                ids.len(),
                embeddings.len()
            )));
        }
        for embedding in &embeddings {
            validate_dimension(dimension, embedding.len())?;
        }

        debug!(rows = ids.len(), "Built flat vector index");
        Ok(Self {
            ids,
            embeddings,
            dimension,
        })
    }

    /// Number of indexed embeddings.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the index holds no embeddings.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Embedding dimension this index accepts.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Finds the `k` nearest chunks to the query embedding.
    ///
    /// Returns up to `min(k, len)` hits sorted by ascending squared distance.
    /// The sort is stable, so equidistant chunks keep their row order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<VectorHit>, SearchError> {
        validate_dimension(self.dimension, query.len())?;

        let mut hits: Vec<VectorHit> = self
            .ids
            .iter()
            .zip(&self.embeddings)
            .map(|(&chunk_id, embedding)| VectorHit {
                chunk_id,
                distance: squared_euclidean(query, embedding),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Squared Euclidean distance between two equal-length vectors.
///
/// The square root is skipped: it is monotonic, so rankings are unchanged,
/// and downstream scores are normalized anyway.
fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
