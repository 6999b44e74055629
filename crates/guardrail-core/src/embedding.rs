//! Embedding abstractions.
//!
//! The embedding model is an external collaborator: the engine only requires
//! a deterministic function from texts to fixed-dimension vectors. Real
//! model backends (ONNX sentence encoders, remote embedding APIs) implement
//! [`Embedder`]; the bundled [`HashEmbedder`] is a deterministic
//! feature-hashing implementation that lets the full pipeline and the test
//! suite run without model weights.

use crate::config::EMBEDDING_DIM;
use crate::error::EmbedError;

/// Narrow interface over an embedding model.
///
/// Implementations must be deterministic: the same text always maps to the
/// same vector, and every vector has exactly [`dimension`](Self::dimension)
/// components. Both retrieval idempotence and index/query compatibility
/// depend on this.
pub trait Embedder: Send + Sync {
    /// Fixed output dimension of this embedder.
    fn dimension(&self) -> usize;

    /// Embeds a batch of texts, one vector per input, in input order.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embeds a single text.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed(std::slice::from_ref(&text.to_string()))?;
        vectors.pop().ok_or_else(|| {
            EmbedError::InferenceFailed("embedder returned no vector".to_string())
        })
    }
}

/// Deterministic feature-hashing embedder.
///
/// Tokenizes on whitespace, lowercases, hashes each token with FNV-1a, and
/// accumulates a signed count into `hash % dimension` buckets. The result is
/// L2-normalized so squared-Euclidean distances are comparable across texts
/// of different lengths. Texts sharing vocabulary land near each other,
/// which is enough signal for retrieval tests and offline smoke runs.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Creates a hashing embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.split_whitespace() {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            // One hash bit decides the sign, the standard feature-hashing
            // trick to keep bucket collisions from only accumulating.
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// FNV-1a 64-bit hash. Stable across platforms and releases, unlike the
/// standard library's `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_respected() {
        let embedder = HashEmbedder::new(64);
        let vectors = embedder
            .embed(&["machine guarding".to_string(), "ppe".to_string()])
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 64));
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::new(32);
        let a = embedder.embed_one("lockout tagout procedures").unwrap();
        let b = embedder.embed_one("lockout tagout procedures").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_case_insensitive_tokens() {
        let embedder = HashEmbedder::new(32);
        let a = embedder.embed_one("Machine Guarding").unwrap();
        let b = embedder.embed_one("machine guarding").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_texts_differ() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed_one("forklift operation safety").unwrap();
        let b = embedder.embed_one("chemical spill response").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unit_norm() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.embed_one("hearing protection required in this area").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed_one("").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::new(256);
        let query = embedder.embed_one("machine guarding requirements").unwrap();
        let near = embedder
            .embed_one("guarding requirements for fixed machine installations")
            .unwrap();
        let far = embedder
            .embed_one("respirator cartridge replacement schedule")
            .unwrap();

        let dist = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
        };
        assert!(dist(&query, &near) < dist(&query, &far));
    }
}
