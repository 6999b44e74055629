//! Retrieval and ranking.
//!
//! The retrieval pipeline has two modes over the same exact vector index:
//!
//! - **Baseline**: rank chunks by squared-Euclidean distance between the
//!   query embedding and chunk embeddings ([`vector`]).
//! - **Hybrid**: over-fetch a candidate pool from the vector index, score the
//!   pool with BM25 against the query ([`lexical`]), then fuse both signals
//!   with min-max normalization and a weighted sum ([`fusion`]).
//!
//! Either way, the governing score of the top context is checked against an
//! abstention threshold ([`abstain`]) before an answer is assembled.
//! [`engine`] ties the pieces together over a [`ChunkStore`](crate::storage::ChunkStore).

pub mod abstain;
pub mod engine;
pub mod fusion;
pub mod lexical;
pub mod types;
pub mod vector;

pub use abstain::AbstainPolicy;
pub use engine::RetrievalEngine;
pub use types::{
    AnswerEnvelope, ChunkId, ChunkRecord, RankedContext, SearchError, SearchMode,
};
pub use vector::VectorIndex;
