use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique chunk identifier.
///
/// IDs are assigned sequentially during ingestion, starting from 1 each
/// pass. Ingestion always rebuilds the store from scratch, so the same
/// corpus reproduces the same ids, which the vector index row mapping and
/// the evaluation harness both rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Creates a ChunkId from a raw u64 value.
    pub fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Stored chunk with its source document and position.
///
/// Internal representation of one retrieval unit after ingestion. The text
/// is the full word-window; previews are cut at presentation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk identifier
    pub id: ChunkId,
    /// Source document file name (e.g. `machine_guarding.pdf`)
    pub doc_name: String,
    /// Position of this chunk within its document (0-based)
    pub ordinal: u32,
    /// Full chunk text
    pub text: String,
}

/// Retrieval mode selecting the ranking pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Vector similarity only
    Baseline,
    /// Vector similarity fused with BM25 over the candidate pool
    Hybrid,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Baseline => write!(f, "baseline"),
            SearchMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(SearchMode::Baseline),
            "hybrid" => Ok(SearchMode::Hybrid),
            other => Err(format!(
                "unknown search mode '{}' (expected 'baseline' or 'hybrid')",
                other
            )),
        }
    }
}

/// One retrieved context in an answer, ranked best-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedContext {
    /// 1-based rank within this answer
    pub rank: usize,
    /// Source document name
    pub doc: String,
    /// Governing relevance score in [0, 1]
    pub score: f32,
    /// Citation URL, if the document is in the source table
    pub url: Option<String>,
    /// Text preview (full chunk text truncated for display)
    pub text: String,
}

/// Complete response to one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEnvelope {
    /// Extractive answer assembled from the top contexts; `None` when the
    /// engine abstains or the contexts carry no usable sentences
    pub answer: Option<String>,
    /// Ranked supporting contexts (empty on an empty index)
    pub contexts: Vec<RankedContext>,
    /// Name of the ranking mode that produced the contexts
    pub reranker_used: String,
    /// Whether the engine declined to answer
    pub abstained: bool,
}

/// Error types for search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// Storage backend error
    #[error("Storage error: {0}")]
    StorageError(String),
    /// Embedding generation error
    #[error("Embedding error: {0}")]
    EmbeddingError(String),
    /// Index construction or query error
    #[error("Index error: {0}")]
    IndexError(String),
    /// Vector dimension mismatch (expected vs actual)
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual embedding dimension received
        actual: usize,
    },
    /// Invalid search query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<crate::storage::StoreError> for SearchError {
    fn from(err: crate::storage::StoreError) -> Self {
        SearchError::StorageError(err.to_string())
    }
}

impl From<crate::error::EmbedError> for SearchError {
    fn from(err: crate::error::EmbedError) -> Self {
        SearchError::EmbeddingError(err.to_string())
    }
}

/// Validates that an embedding has the expected dimension.
///
/// Returns `Ok(())` if dimensions match, or
/// `Err(SearchError::DimensionMismatch)` otherwise.
pub fn validate_dimension(expected: usize, actual: usize) -> Result<(), SearchError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SearchError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_round_trip() {
        let id = ChunkId::from_u64(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(id, ChunkId::from_u64(42));
    }

    #[test]
    fn test_search_mode_round_trip() {
        assert_eq!("baseline".parse::<SearchMode>().unwrap(), SearchMode::Baseline);
        assert_eq!("Hybrid".parse::<SearchMode>().unwrap(), SearchMode::Hybrid);
        assert_eq!(SearchMode::Hybrid.to_string(), "hybrid");
        assert!("fuzzy".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_validate_dimension() {
        assert!(validate_dimension(3, 3).is_ok());
        assert!(matches!(
            validate_dimension(384, 512),
            Err(SearchError::DimensionMismatch {
                expected: 384,
                actual: 512
            })
        ));
    }

    #[test]
    fn test_chunk_record_json_round_trip() {
        let record = ChunkRecord {
            id: ChunkId::from_u64(7),
            doc_name: "forklift_safety.pdf".to_string(),
            ordinal: 2,
            text: "Operators shall be trained and certified.".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ChunkRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
