//! Redb-backed chunk store.
//!
//! Uses [redb](https://github.com/cberner/redb) - a pure Rust, ACID-compliant,
//! embedded B-tree database. One file holds both tables, so the chunk texts
//! and the embeddings they were indexed from move together.
//!
//! # Tables
//!
//! - `chunks`: ChunkId (u64) -> ChunkRecord (JSON)
//! - `embeddings`: ChunkId (u64) -> `Vec<f32>` (raw bytes, little-endian)

use super::{ChunkStore, StoreError};
use crate::search::types::{ChunkId, ChunkRecord};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

const CHUNKS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("chunks");
const EMBEDDINGS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("embeddings");

/// Redb-backed chunk store.
///
/// B-tree tables iterate in ascending key order, which satisfies the
/// [`ChunkStore`] ordering contract without extra sorting.
///
/// # Example
///
/// ```ignore
/// use guardrail_core::storage::RedbChunkStore;
///
/// let store = RedbChunkStore::open("./data/chunks.redb")?;
/// store.put_chunk(chunk_id, &chunk).await?;
/// ```
pub struct RedbChunkStore {
    db: Arc<Database>,
}

impl RedbChunkStore {
    /// Opens or creates a redb database at the given path.
    ///
    /// Creates the database file and both tables if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref())
            .map_err(|e| StoreError::DatabaseError(format!("Failed to open database: {}", e)))?;

        // Create tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(|e| {
                StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
            })?;

            write_txn.open_table(CHUNKS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to create chunks table: {}", e))
            })?;
            write_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to create embeddings table: {}", e))
            })?;

            write_txn.commit().map_err(|e| {
                StoreError::DatabaseError(format!("Failed to commit table creation: {}", e))
            })?;
        }

        Ok(Self { db: Arc::new(db) })
    }

    /// Serializes a ChunkRecord to JSON bytes.
    fn serialize_chunk(chunk: &ChunkRecord) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(chunk).map_err(|e| {
            StoreError::SerializationError(format!("Failed to serialize chunk: {}", e))
        })
    }

    /// Deserializes a ChunkRecord from JSON bytes.
    fn deserialize_chunk(bytes: &[u8]) -> Result<ChunkRecord, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| {
            StoreError::SerializationError(format!("Failed to deserialize chunk: {}", e))
        })
    }

    /// Serializes an embedding to raw bytes.
    ///
    /// Format: Little-endian f32 values packed sequentially (4 bytes per
    /// value). Denser than JSON; a 384-dimension embedding is 1.5KB.
    ///
    /// NOTE: Endianness MUST match `deserialize_embedding()`.
    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(embedding.len() * 4);
        for &val in embedding {
            bytes.extend_from_slice(&val.to_le_bytes());
        }
        bytes
    }

    /// Deserializes an embedding from raw bytes.
    ///
    /// Format: Little-endian f32 values (4 bytes per value).
    /// See `serialize_embedding()` for format details.
    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

#[async_trait::async_trait(?Send)]
impl ChunkStore for RedbChunkStore {
    async fn put_chunk(&self, id: ChunkId, chunk: &ChunkRecord) -> Result<(), StoreError> {
        let bytes = Self::serialize_chunk(chunk)?;

        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        {
            let mut table = write_txn.open_table(CHUNKS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open chunks table: {}", e))
            })?;

            table
                .insert(id.as_u64(), bytes.as_slice())
                .map_err(|e| StoreError::DatabaseError(format!("Failed to insert chunk: {}", e)))?;
        }

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit chunk: {}", e)))?;

        Ok(())
    }

    async fn get_chunk(&self, id: ChunkId) -> Result<Option<ChunkRecord>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(CHUNKS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open chunks table: {}", e))
        })?;

        match table.get(id.as_u64()) {
            Ok(Some(guard)) => {
                let chunk = Self::deserialize_chunk(guard.value())?;
                Ok(Some(chunk))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::DatabaseError(format!(
                "Failed to get chunk: {}",
                e
            ))),
        }
    }

    async fn get_chunks_batch(&self, ids: &[ChunkId]) -> Result<Vec<ChunkRecord>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(CHUNKS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open chunks table: {}", e))
        })?;

        let mut chunks = Vec::with_capacity(ids.len());
        for id in ids {
            match table.get(id.as_u64()) {
                Ok(Some(guard)) => chunks.push(Self::deserialize_chunk(guard.value())?),
                Ok(None) => {
                    warn!(chunk_id = id.as_u64(), "Ranked chunk missing from store");
                }
                Err(e) => {
                    return Err(StoreError::DatabaseError(format!(
                        "Failed to get chunk: {}",
                        e
                    )))
                }
            }
        }

        Ok(chunks)
    }

    async fn iter_chunks(&self) -> Result<Vec<(ChunkId, ChunkRecord)>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(CHUNKS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open chunks table: {}", e))
        })?;

        let mut chunks = Vec::new();
        let iter = table
            .iter()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to iterate chunks: {}", e)))?;

        for result in iter {
            let (key, value) = result.map_err(|e| {
                StoreError::DatabaseError(format!("Failed to read chunk entry: {}", e))
            })?;
            chunks.push((
                ChunkId::from_u64(key.value()),
                Self::deserialize_chunk(value.value())?,
            ));
        }

        Ok(chunks)
    }

    async fn put_embedding(&self, id: ChunkId, embedding: &[f32]) -> Result<(), StoreError> {
        let bytes = Self::serialize_embedding(embedding);

        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        {
            let mut table = write_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to open embeddings table: {}", e))
            })?;

            table.insert(id.as_u64(), bytes.as_slice()).map_err(|e| {
                StoreError::DatabaseError(format!("Failed to insert embedding: {}", e))
            })?;
        }

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit embedding: {}", e)))?;

        Ok(())
    }

    async fn get_embedding(&self, id: ChunkId) -> Result<Option<Vec<f32>>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open embeddings table: {}", e))
        })?;

        match table.get(id.as_u64()) {
            Ok(Some(guard)) => Ok(Some(Self::deserialize_embedding(guard.value()))),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::DatabaseError(format!(
                "Failed to get embedding: {}",
                e
            ))),
        }
    }

    async fn iter_embeddings(&self) -> Result<Vec<(ChunkId, Vec<f32>)>, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open embeddings table: {}", e))
        })?;

        let mut embeddings = Vec::new();
        let iter = table.iter().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to iterate embeddings: {}", e))
        })?;

        for result in iter {
            let (key, value) = result.map_err(|e| {
                StoreError::DatabaseError(format!("Failed to read embedding entry: {}", e))
            })?;
            embeddings.push((
                ChunkId::from_u64(key.value()),
                Self::deserialize_embedding(value.value()),
            ));
        }

        Ok(embeddings)
    }

    async fn chunk_count(&self) -> Result<usize, StoreError> {
        let read_txn = self.db.begin_read().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin read transaction: {}", e))
        })?;

        let table = read_txn.open_table(CHUNKS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to open chunks table: {}", e))
        })?;

        let count = table
            .len()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to get chunk count: {}", e)))?;

        Ok(count as usize)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(|e| {
            StoreError::DatabaseError(format!("Failed to begin write transaction: {}", e))
        })?;

        // Dropping and recreating the tables is simpler and faster than
        // removing keys one at a time.
        write_txn.delete_table(CHUNKS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to delete chunks table: {}", e))
        })?;
        write_txn.delete_table(EMBEDDINGS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to delete embeddings table: {}", e))
        })?;
        write_txn.open_table(CHUNKS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to recreate chunks table: {}", e))
        })?;
        write_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| {
            StoreError::DatabaseError(format!("Failed to recreate embeddings table: {}", e))
        })?;

        write_txn
            .commit()
            .map_err(|e| StoreError::DatabaseError(format!("Failed to commit clear: {}", e)))?;

        Ok(())
    }
}
