//! Chunk store abstractions.
//!
//! The chunk store is the persistent table behind the retrieval engine:
//! chunk id → (document name, ordinal, text), plus one embedding per chunk.
//! Both live in a single database so the index data and its id mapping can
//! never be loaded separately.
//!
//! # Implementations
//!
//! - [`InMemoryChunkStore`] - `BTreeMap`-backed store for tests
//! - [`RedbChunkStore`] - redb-backed store for native persistence

mod redb_store;

pub use redb_store::RedbChunkStore;

use crate::search::types::{ChunkId, ChunkRecord};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during chunk store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (filesystem)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Database error (redb)
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Persistent chunk table with per-chunk embeddings.
///
/// Iteration order is ascending by chunk id in every implementation, which
/// keeps vector index construction deterministic across loads.
#[async_trait::async_trait(?Send)]
pub trait ChunkStore {
    /// Stores a chunk, overwriting any existing chunk with the same id.
    async fn put_chunk(&self, id: ChunkId, chunk: &ChunkRecord) -> Result<(), StoreError>;

    /// Retrieves a chunk by id; `Ok(None)` if absent.
    async fn get_chunk(&self, id: ChunkId) -> Result<Option<ChunkRecord>, StoreError>;

    /// Retrieves multiple chunks in input order; missing ids are skipped.
    async fn get_chunks_batch(&self, ids: &[ChunkId]) -> Result<Vec<ChunkRecord>, StoreError>;

    /// Returns all chunks ordered by ascending id.
    async fn iter_chunks(&self) -> Result<Vec<(ChunkId, ChunkRecord)>, StoreError>;

    /// Stores an embedding for a chunk, overwriting any existing one.
    async fn put_embedding(&self, id: ChunkId, embedding: &[f32]) -> Result<(), StoreError>;

    /// Retrieves an embedding by chunk id; `Ok(None)` if absent.
    async fn get_embedding(&self, id: ChunkId) -> Result<Option<Vec<f32>>, StoreError>;

    /// Returns all embeddings ordered by ascending chunk id.
    ///
    /// This feeds index construction at engine load; the ordering contract
    /// keeps the index row ↔ chunk id mapping in lockstep across rebuilds.
    async fn iter_embeddings(&self) -> Result<Vec<(ChunkId, Vec<f32>)>, StoreError>;

    /// Number of chunks in the store.
    async fn chunk_count(&self) -> Result<usize, StoreError>;

    /// Removes all chunks and embeddings (full rebuild starts here).
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory chunk store for tests.
///
/// `BTreeMap` keeps iteration sorted by chunk id, matching the redb
/// backend's ordering contract.
#[derive(Default)]
pub struct InMemoryChunkStore {
    chunks: std::sync::RwLock<BTreeMap<u64, ChunkRecord>>,
    embeddings: std::sync::RwLock<BTreeMap<u64, Vec<f32>>>,
}

impl InMemoryChunkStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait(?Send)]
impl ChunkStore for InMemoryChunkStore {
    async fn put_chunk(&self, id: ChunkId, chunk: &ChunkRecord) -> Result<(), StoreError> {
        let mut chunks = self
            .chunks
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        chunks.insert(id.as_u64(), chunk.clone());
        Ok(())
    }

    async fn get_chunk(&self, id: ChunkId) -> Result<Option<ChunkRecord>, StoreError> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(chunks.get(&id.as_u64()).cloned())
    }

    async fn get_chunks_batch(&self, ids: &[ChunkId]) -> Result<Vec<ChunkRecord>, StoreError> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(ids
            .iter()
            .filter_map(|id| chunks.get(&id.as_u64()).cloned())
            .collect())
    }

    async fn iter_chunks(&self) -> Result<Vec<(ChunkId, ChunkRecord)>, StoreError> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(chunks
            .iter()
            .map(|(&id, record)| (ChunkId::from_u64(id), record.clone()))
            .collect())
    }

    async fn put_embedding(&self, id: ChunkId, embedding: &[f32]) -> Result<(), StoreError> {
        let mut embeddings = self
            .embeddings
            .write()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        embeddings.insert(id.as_u64(), embedding.to_vec());
        Ok(())
    }

    async fn get_embedding(&self, id: ChunkId) -> Result<Option<Vec<f32>>, StoreError> {
        let embeddings = self
            .embeddings
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(embeddings.get(&id.as_u64()).cloned())
    }

    async fn iter_embeddings(&self) -> Result<Vec<(ChunkId, Vec<f32>)>, StoreError> {
        let embeddings = self
            .embeddings
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(embeddings
            .iter()
            .map(|(&id, embedding)| (ChunkId::from_u64(id), embedding.clone()))
            .collect())
    }

    async fn chunk_count(&self) -> Result<usize, StoreError> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
        Ok(chunks.len())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        {
            let mut chunks = self
                .chunks
                .write()
                .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
            chunks.clear();
        }
        {
            let mut embeddings = self
                .embeddings
                .write()
                .map_err(|e| StoreError::DatabaseError(format!("Lock poisoned: {}", e)))?;
            embeddings.clear();
        }
        Ok(())
    }
}

// Blanket implementation for Arc<T>, so one store can back both the
// ingestion pipeline and a retrieval engine in the same process.
#[async_trait::async_trait(?Send)]
impl<T: ChunkStore> ChunkStore for std::sync::Arc<T> {
    async fn put_chunk(&self, id: ChunkId, chunk: &ChunkRecord) -> Result<(), StoreError> {
        (**self).put_chunk(id, chunk).await
    }

    async fn get_chunk(&self, id: ChunkId) -> Result<Option<ChunkRecord>, StoreError> {
        (**self).get_chunk(id).await
    }

    async fn get_chunks_batch(&self, ids: &[ChunkId]) -> Result<Vec<ChunkRecord>, StoreError> {
        (**self).get_chunks_batch(ids).await
    }

    async fn iter_chunks(&self) -> Result<Vec<(ChunkId, ChunkRecord)>, StoreError> {
        (**self).iter_chunks().await
    }

    async fn put_embedding(&self, id: ChunkId, embedding: &[f32]) -> Result<(), StoreError> {
        (**self).put_embedding(id, embedding).await
    }

    async fn get_embedding(&self, id: ChunkId) -> Result<Option<Vec<f32>>, StoreError> {
        (**self).get_embedding(id).await
    }

    async fn iter_embeddings(&self) -> Result<Vec<(ChunkId, Vec<f32>)>, StoreError> {
        (**self).iter_embeddings().await
    }

    async fn chunk_count(&self) -> Result<usize, StoreError> {
        (**self).chunk_count().await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}
