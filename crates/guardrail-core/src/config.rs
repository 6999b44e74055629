//! Production configuration constants.
//!
//! These values define the default retrieval configuration and are shared by
//! the ingestion pipeline, the query engine, and the evaluation harness.

// =============================================================================
// Chunking
// =============================================================================

/// Chunk window size in words.
///
/// Each retrievable unit is a contiguous window of this many words. Roughly
/// a page of prose, small enough for a focused embedding, large enough that
/// an extractive snippet has context.
pub const CHUNK_WINDOW_WORDS: usize = 300;

/// Overlap between consecutive chunks, in words.
///
/// Overlap prevents a relevant sentence straddling a chunk boundary from
/// being split across two weakly-matching chunks.
pub const CHUNK_OVERLAP_WORDS: usize = 50;

// =============================================================================
// Embedding
// =============================================================================

/// Embedding vector dimension.
///
/// Must match the configured [`Embedder`](crate::embedding::Embedder)
/// implementation; 384 matches MiniLM-class sentence encoders as well as the
/// bundled hashing embedder's default.
pub const EMBEDDING_DIM: usize = 384;

// =============================================================================
// Ranking and abstention
// =============================================================================

/// Weight given to the semantic (vector) signal in hybrid fusion.
///
/// `fused = ALPHA * norm(similarity) + (1 - ALPHA) * norm(bm25)`.
/// 0.6 leans semantic while still letting exact keyword matches re-rank.
pub const FUSION_ALPHA: f32 = 0.6;

/// Candidate over-fetch factor for hybrid mode.
///
/// The vector index is asked for `k * OVERFETCH_FACTOR` candidates so the
/// lexical stage has enough material to re-rank before truncating to `k`.
pub const OVERFETCH_FACTOR: usize = 2;

/// Abstention threshold on the governing score.
///
/// Both modes report a governing score in [0, 1] (see
/// [`baseline_similarity`](crate::search::abstain::baseline_similarity));
/// a top result strictly below this threshold yields no answer.
pub const SCORE_THRESHOLD: f32 = 0.3;

/// Epsilon floor for min-max normalization denominators.
///
/// A candidate set where every score is equal would otherwise divide by
/// zero; the floor makes degenerate sets normalize to all zeros instead.
pub const NORM_EPSILON: f32 = 1e-9;

// =============================================================================
// Presentation
// =============================================================================

/// Maximum characters of chunk text carried in a ranked context.
pub const PREVIEW_CHARS: usize = 300;

/// Number of leading sentences extracted per context when composing the answer.
pub const SNIPPET_SENTENCES: usize = 2;
