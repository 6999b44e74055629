//! Error types for guardrail-core.
//!
//! Search and storage errors live next to their modules
//! ([`SearchError`](crate::search::types::SearchError),
//! [`StoreError`](crate::storage::StoreError)); this module holds the
//! remaining cross-cutting error types.

use thiserror::Error;

/// Errors that can occur during text chunking.
#[derive(Debug, Clone, Error)]
pub enum ChunkingError {
    /// Invalid chunking configuration (zero window, or overlap >= window)
    #[error("Invalid chunking config: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur during embedding operations.
#[derive(Debug, Clone, Error)]
pub enum EmbedError {
    /// Model backend failed to produce vectors
    #[error("Embedding failed: {0}")]
    InferenceFailed(String),
    /// Backend produced a vector of the wrong dimension
    #[error("Embedder produced dimension {actual}, expected {expected}")]
    DimensionMismatch {
        /// Dimension the embedder advertises
        expected: usize,
        /// Dimension actually produced
        actual: usize,
    },
}

/// Errors that can occur during the ingestion pipeline.
///
/// Per-file extraction failures are not represented here: ingestion logs and
/// skips them, and only aborts on storage or configuration failures.
#[derive(Debug, Clone, Error)]
pub enum IngestError {
    /// Failed to read the source directory
    #[error("I/O error: {0}")]
    Io(String),
    /// Text extraction failed for a single file
    #[error("Extraction failed: {0}")]
    Extraction(String),
    /// Chunk store operation failed
    #[error("Storage error: {0}")]
    Store(String),
    /// Embedding pass failed
    #[error("Embedding error: {0}")]
    Embed(String),
    /// Invalid chunking parameters
    #[error("Invalid chunking config: {0}")]
    Chunking(String),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err.to_string())
    }
}

impl From<crate::storage::StoreError> for IngestError {
    fn from(err: crate::storage::StoreError) -> Self {
        IngestError::Store(err.to_string())
    }
}

impl From<EmbedError> for IngestError {
    fn from(err: EmbedError) -> Self {
        IngestError::Embed(err.to_string())
    }
}

impl From<ChunkingError> for IngestError {
    fn from(err: ChunkingError) -> Self {
        IngestError::Chunking(err.to_string())
    }
}
