//! Retrieval engine orchestration.
//!
//! [`RetrievalEngine`] owns the loaded vector index and wires the full
//! question path: embed the query, rank chunks (baseline or hybrid),
//! resolve the survivors against the chunk store, apply the abstention
//! policy, and assemble the answer envelope.
//!
//! The index is built once at load time from the store's embeddings and is
//! immutable afterwards; re-ingestion requires a reload.

use super::abstain::{baseline_similarity, AbstainPolicy};
use super::fusion::{fuse, FusedHit};
use super::lexical::bm25_scores;
use super::types::{AnswerEnvelope, ChunkRecord, RankedContext, SearchError, SearchMode};
use super::vector::VectorIndex;
use crate::answer::compose_answer;
use crate::citations::SourceTable;
use crate::config::{FUSION_ALPHA, OVERFETCH_FACTOR, PREVIEW_CHARS};
use crate::embedding::Embedder;
use crate::storage::ChunkStore;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Retrieval engine over a chunk store and a loaded vector index.
pub struct RetrievalEngine<S: ChunkStore> {
    store: S,
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    sources: SourceTable,
    policy: AbstainPolicy,
}

impl<S: ChunkStore> RetrievalEngine<S> {
    /// Loads the engine, building the vector index from stored embeddings.
    ///
    /// Embeddings whose dimension disagrees with the embedder are logged
    /// and skipped rather than failing the load; they were written by an
    /// incompatible embedder and can never match a query.
    #[instrument(skip_all)]
    pub async fn load(
        store: S,
        embedder: Arc<dyn Embedder>,
        sources: SourceTable,
    ) -> Result<Self, SearchError> {
        let dimension = embedder.dimension();
        let stored = store.iter_embeddings().await?;

        let mut ids = Vec::with_capacity(stored.len());
        let mut embeddings = Vec::with_capacity(stored.len());
        for (chunk_id, embedding) in stored {
            if embedding.len() != dimension {
                warn!(
                    chunk_id = chunk_id.as_u64(),
                    expected = dimension,
                    actual = embedding.len(),
                    "Skipping embedding with mismatched dimension"
                );
                continue;
            }
            ids.push(chunk_id);
            embeddings.push(embedding);
        }

        let index = if ids.is_empty() {
            VectorIndex::empty(dimension)
        } else {
            VectorIndex::build(ids, embeddings, dimension)?
        };

        info!(
            indexed = index.len(),
            dimension,
            citations = sources.len(),
            "Retrieval engine loaded"
        );

        Ok(Self {
            store,
            embedder,
            index,
            sources,
            policy: AbstainPolicy::default(),
        })
    }

    /// Replaces the default abstention policy.
    pub fn with_policy(mut self, policy: AbstainPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of indexed chunks.
    pub fn indexed_chunks(&self) -> usize {
        self.index.len()
    }

    /// Answers a question, returning ranked contexts and an extractive
    /// answer, or an abstention.
    ///
    /// `k` is the number of contexts to return. In hybrid mode the vector
    /// index is over-fetched by [`OVERFETCH_FACTOR`] and the candidate pool
    /// is re-ranked with BM25 fusion before the cut back to `k`.
    #[instrument(skip(self), fields(mode = %mode, k))]
    pub async fn ask(
        &self,
        query: &str,
        k: usize,
        mode: SearchMode,
    ) -> Result<AnswerEnvelope, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "query must not be blank".to_string(),
            ));
        }
        if k == 0 {
            return Err(SearchError::InvalidQuery(
                "k must be at least 1".to_string(),
            ));
        }

        if self.index.is_empty() {
            debug!("Index is empty, abstaining");
            return Ok(AnswerEnvelope {
                answer: None,
                contexts: Vec::new(),
                reranker_used: mode.to_string(),
                abstained: true,
            });
        }

        let query_embedding = self.embedder.embed_one(query)?;

        let scored = match mode {
            SearchMode::Baseline => self.rank_baseline(&query_embedding, k)?,
            SearchMode::Hybrid => self.rank_hybrid(query, &query_embedding, k).await?,
        };

        let contexts = self.resolve_contexts(&scored).await?;
        let abstained = self.policy.should_abstain(contexts.first().map(|c| c.score));
        let answer = if abstained {
            None
        } else {
            compose_answer(&contexts)
        };

        debug!(
            contexts = contexts.len(),
            abstained,
            top_score = contexts.first().map(|c| c.score),
            "Question answered"
        );

        Ok(AnswerEnvelope {
            answer,
            contexts,
            reranker_used: mode.to_string(),
            abstained,
        })
    }

    /// Baseline ranking: nearest neighbors by squared distance, scored on
    /// the [0, 1] similarity scale.
    fn rank_baseline(&self, query: &[f32], k: usize) -> Result<Vec<FusedHit>, SearchError> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|hit| FusedHit {
                chunk_id: hit.chunk_id,
                score: baseline_similarity(hit.distance),
            })
            .collect())
    }

    /// Hybrid ranking: over-fetch a candidate pool, score it with BM25,
    /// and fuse both signals.
    ///
    /// Candidates whose chunk record has gone missing from the store are
    /// dropped from the pool before lexical scoring.
    async fn rank_hybrid(
        &self,
        query: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<FusedHit>, SearchError> {
        let pool_size = k.saturating_mul(OVERFETCH_FACTOR);
        let pool = self.index.search(query_embedding, pool_size)?;

        let mut survivors = Vec::with_capacity(pool.len());
        let mut texts = Vec::with_capacity(pool.len());
        for hit in pool {
            match self.store.get_chunk(hit.chunk_id).await? {
                Some(record) => {
                    survivors.push(hit);
                    texts.push(record.text);
                }
                None => {
                    warn!(
                        chunk_id = hit.chunk_id.as_u64(),
                        "Indexed chunk missing from store, dropping candidate"
                    );
                }
            }
        }

        let lexical = bm25_scores(query, &texts);
        Ok(fuse(&survivors, &lexical, FUSION_ALPHA, k))
    }

    /// Resolves ranked hits into presentation contexts.
    ///
    /// Ranks are dense over the survivors: if a hit's record is missing the
    /// remaining contexts close the gap, so markers in the answer always
    /// reference an existing context.
    async fn resolve_contexts(
        &self,
        scored: &[FusedHit],
    ) -> Result<Vec<RankedContext>, SearchError> {
        let mut contexts = Vec::with_capacity(scored.len());
        for hit in scored {
            let Some(record) = self.store.get_chunk(hit.chunk_id).await? else {
                warn!(
                    chunk_id = hit.chunk_id.as_u64(),
                    "Ranked chunk missing from store, skipping"
                );
                continue;
            };
            contexts.push(self.make_context(contexts.len() + 1, hit.score, &record));
        }
        Ok(contexts)
    }

    fn make_context(&self, rank: usize, score: f32, record: &ChunkRecord) -> RankedContext {
        RankedContext {
            rank,
            doc: record.doc_name.clone(),
            score,
            url: self.sources.url_for(&record.doc_name).map(String::from),
            text: preview(&record.text, PREVIEW_CHARS),
        }
    }
}

/// Truncates text to at most `max_chars` characters for display, appending
/// an ellipsis when anything was cut. Splits on character boundaries, never
/// inside a code point.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::search::types::ChunkId;
    use crate::storage::InMemoryChunkStore;

    fn engine_parts() -> (InMemoryChunkStore, Arc<dyn Embedder>) {
        (InMemoryChunkStore::new(), Arc::new(HashEmbedder::new(64)))
    }

    async fn seed(store: &InMemoryChunkStore, embedder: &Arc<dyn Embedder>, texts: &[&str]) {
        for (i, text) in texts.iter().enumerate() {
            let id = ChunkId::from_u64(i as u64 + 1);
            let record = ChunkRecord {
                id,
                doc_name: "safety_manual.pdf".to_string(),
                ordinal: i as u32,
                text: text.to_string(),
            };
            store.put_chunk(id, &record).await.unwrap();
            let embedding = embedder.embed_one(text).unwrap();
            store.put_embedding(id, &embedding).await.unwrap();
        }
    }

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(preview("short", 300), "short");
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        let long = "a".repeat(400);
        let cut = preview(&long, 300);
        assert_eq!(cut.len(), 303);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(10);
        let cut = preview(&text, 4);
        assert_eq!(cut, format!("{}...", "é".repeat(4)));
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let (store, embedder) = engine_parts();
        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap();
        let result = engine.ask("   ", 5, SearchMode::Baseline).await;
        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_zero_k_rejected() {
        let (store, embedder) = engine_parts();
        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap();
        let result = engine.ask("guarding", 0, SearchMode::Hybrid).await;
        assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_empty_index_abstains_with_no_contexts() {
        let (store, embedder) = engine_parts();
        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap();
        let envelope = engine.ask("guarding", 5, SearchMode::Hybrid).await.unwrap();
        assert!(envelope.abstained);
        assert!(envelope.answer.is_none());
        assert!(envelope.contexts.is_empty());
        assert_eq!(envelope.reranker_used, "hybrid");
    }

    #[tokio::test]
    async fn test_baseline_ranks_matching_chunk_first() {
        let (store, embedder) = engine_parts();
        seed(
            &store,
            &embedder,
            &[
                "Machine guarding protects operators from moving parts. Guards must be secured.",
                "Forklift operators shall be trained before use. Daily inspections are required.",
                "Emergency eyewash stations must be within ten seconds of chemical work areas.",
            ],
        )
        .await;

        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap();
        let envelope = engine
            .ask("machine guarding moving parts", 2, SearchMode::Baseline)
            .await
            .unwrap();

        assert_eq!(envelope.contexts.len(), 2);
        assert!(envelope.contexts[0].text.starts_with("Machine guarding"));
        assert_eq!(envelope.reranker_used, "baseline");
        // Dense 1-based ranks
        assert_eq!(envelope.contexts[0].rank, 1);
        assert_eq!(envelope.contexts[1].rank, 2);
        // Baseline scores live in [0, 1] and descend
        assert!(envelope.contexts[0].score >= envelope.contexts[1].score);
        assert!(envelope.contexts[0].score <= 1.0);
    }

    #[tokio::test]
    async fn test_hybrid_returns_at_most_k() {
        let (store, embedder) = engine_parts();
        seed(
            &store,
            &embedder,
            &[
                "Lockout tagout procedures control hazardous energy during servicing.",
                "Lockout devices shall be durable and standardized.",
                "Hearing protection is required above eighty five decibels.",
                "Respirators require annual fit testing.",
            ],
        )
        .await;

        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap();
        let envelope = engine
            .ask("lockout tagout energy", 2, SearchMode::Hybrid)
            .await
            .unwrap();

        assert!(envelope.contexts.len() <= 2);
        assert_eq!(envelope.reranker_used, "hybrid");
    }

    #[tokio::test]
    async fn test_answer_cites_existing_contexts() {
        let (store, embedder) = engine_parts();
        seed(
            &store,
            &embedder,
            &["Guards must be affixed to the machine where possible. Guards shall not create new hazards."],
        )
        .await;

        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap()
            .with_policy(AbstainPolicy::new(0.0));
        let envelope = engine
            .ask("machine guards hazards", 3, SearchMode::Baseline)
            .await
            .unwrap();

        assert!(!envelope.abstained);
        let answer = envelope.answer.unwrap();
        assert!(answer.contains("[1]"));
    }

    #[tokio::test]
    async fn test_high_threshold_forces_abstention() {
        let (store, embedder) = engine_parts();
        seed(&store, &embedder, &["Scaffold planks must be secured."]).await;

        let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
            .await
            .unwrap()
            .with_policy(AbstainPolicy::new(2.0));
        let envelope = engine
            .ask("unrelated question entirely", 1, SearchMode::Baseline)
            .await
            .unwrap();

        assert!(envelope.abstained);
        assert!(envelope.answer.is_none());
        // Contexts are still reported so callers can inspect the evidence.
        assert_eq!(envelope.contexts.len(), 1);
    }

    #[tokio::test]
    async fn test_citation_url_attached() {
        let (store, embedder) = engine_parts();
        seed(&store, &embedder, &["Ladders shall be inspected before each use."]).await;

        let sources = SourceTable::from_json_str(
            r#"[{"title": "Safety Manual", "url": "https://example.org/manual"}]"#,
        )
        .unwrap();
        let engine = RetrievalEngine::load(store, embedder, sources).await.unwrap();
        let envelope = engine
            .ask("ladder inspection", 1, SearchMode::Baseline)
            .await
            .unwrap();

        assert_eq!(
            envelope.contexts[0].url.as_deref(),
            Some("https://example.org/manual")
        );
    }
}
