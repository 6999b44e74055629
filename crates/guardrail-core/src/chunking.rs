//! Overlapping word-window chunking.
//!
//! Documents are split into fixed-size windows of words; consecutive windows
//! overlap so a relevant passage near a boundary is fully contained in at
//! least one chunk. The chunk is the unit of retrieval: each window gets an
//! ordinal index within its document and is persisted by the ingestion
//! pipeline, embedded, and indexed.

use crate::config::{CHUNK_OVERLAP_WORDS, CHUNK_WINDOW_WORDS};
use crate::error::ChunkingError;

/// Parameters for word-window chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    /// Window size in words. Must be > 0.
    pub window: usize,
    /// Overlap between consecutive windows in words. Must be < `window`.
    pub overlap: usize,
}

impl ChunkParams {
    /// Creates chunk parameters, rejecting configurations that would produce
    /// a zero or negative step size.
    pub fn new(window: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if window == 0 {
            return Err(ChunkingError::InvalidConfig(
                "window size must be greater than 0".to_string(),
            ));
        }
        if overlap >= window {
            return Err(ChunkingError::InvalidConfig(format!(
                "overlap ({}) must be smaller than window ({})",
                overlap, window
            )));
        }
        Ok(Self { window, overlap })
    }

    /// Word offset advance between consecutive windows.
    pub fn step(&self) -> usize {
        self.window - self.overlap
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            window: CHUNK_WINDOW_WORDS,
            overlap: CHUNK_OVERLAP_WORDS,
        }
    }
}

/// A single chunk produced from one document's text.
///
/// Ordinals are contiguous starting at 0 within the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk within its document (0-based).
    pub ordinal: u32,
    /// Space-joined window of words.
    pub text: String,
}

/// Splits text into overlapping word windows.
///
/// A window of `params.window` words slides from word offset 0, advancing by
/// `window - overlap` each step, until the offset reaches the word count.
/// A document shorter than one window yields exactly one (shorter) chunk;
/// empty or whitespace-only text yields no chunks.
pub fn chunk_words(text: &str, params: &ChunkParams) -> Result<Vec<TextChunk>, ChunkingError> {
    // Re-validate: ChunkParams can be constructed literally.
    let params = ChunkParams::new(params.window, params.overlap)?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < words.len() {
        let end = usize::min(offset + params.window, words.len());
        chunks.push(TextChunk {
            ordinal: chunks.len() as u32,
            text: words[offset..end].join(" "),
        });
        offset += params.step();
    }

    Ok(chunks)
}
