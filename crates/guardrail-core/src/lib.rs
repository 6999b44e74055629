//! # Guardrail Core
//!
//! Retrieval-and-ranking engine for answering natural-language questions over
//! a corpus of industrial-safety documents, with threshold-based abstention
//! when no passage is confident enough.
//!
//! The engine is deliberately split along the seams that matter for testing:
//! the embedding model, the text extractor, and the chunk store are narrow
//! traits, so the fusion and abstention logic can be exercised against
//! deterministic fakes.
//!
//! ## Modules
//!
//! - [`chunking`] - Overlapping word-window chunking of extracted text
//! - [`ingest`] - Offline ingestion pipeline (extract, chunk, embed, persist)
//! - [`embedding`] - Embedder trait and the deterministic hashing embedder
//! - [`search`] - Vector index, BM25 candidate scoring, fusion, abstention
//! - [`answer`] - Extractive snippet assembly with citation markers
//! - [`citations`] - Static document-title to URL table
//! - [`storage`] - Chunk store trait with redb and in-memory backends
//! - [`config`] - Production configuration constants
//! - [`error`] - Error types for chunking, embedding, and ingestion

pub mod answer;
pub mod chunking;
pub mod citations;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod search;
pub mod storage;
