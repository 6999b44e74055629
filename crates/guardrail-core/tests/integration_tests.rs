//! End-to-end integration tests for the complete ingestion and retrieval
//! pipeline.
//!
//! These tests exercise the full workflow:
//! 1. Ingestion: extraction → chunking → storage → embedding
//! 2. Retrieval: query embedding → vector search → BM25 fusion → abstention
//!    → answer assembly
//!
//! Run with: `cargo test -p guardrail-core --test integration_tests`

use guardrail_core::chunking::ChunkParams;
use guardrail_core::citations::SourceTable;
use guardrail_core::embedding::{Embedder, HashEmbedder};
use guardrail_core::ingest::{default_extractors, embed_all, ingest_dir};
use guardrail_core::search::abstain::AbstainPolicy;
use guardrail_core::search::{RetrievalEngine, SearchMode};
use guardrail_core::storage::{ChunkStore, InMemoryChunkStore, RedbChunkStore};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const DIM: usize = 128;

fn corpus_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "machine_guarding.txt",
            "Machine guarding protects operators from moving parts. Guards must be \
             affixed to the machine where possible. Guards shall not create new hazards \
             of their own. Point of operation guarding is required whenever the operation \
             exposes an employee to injury.",
        ),
        (
            "lockout_tagout.txt",
            "Lockout tagout procedures control hazardous energy during servicing. \
             Energy isolating devices shall be locked before maintenance begins. \
             Each authorized employee applies a personal lock and tag. Stored energy \
             must be relieved or restrained before work starts.",
        ),
        (
            "forklift_safety.txt",
            "Forklift operators must complete training and evaluation before operating. \
             Daily pre-shift inspections are mandatory. Loads shall be kept low and \
             tilted back while traveling. Pedestrians always have the right of way.",
        ),
    ]
}

fn write_corpus(dir: &TempDir) {
    for (name, contents) in corpus_files() {
        fs::write(dir.path().join(name), contents).unwrap();
    }
}

async fn build_engine(
    store: InMemoryChunkStore,
    corpus: &TempDir,
    sources: SourceTable,
) -> RetrievalEngine<InMemoryChunkStore> {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    // Small windows so the corpus produces several chunks per file.
    let params = ChunkParams::new(20, 5).unwrap();
    ingest_dir(&store, corpus.path(), &default_extractors(), &params)
        .await
        .unwrap();
    embed_all(&store, &HashEmbedder::new(DIM)).await.unwrap();
    RetrievalEngine::load(store, embedder, sources).await.unwrap()
}

#[tokio::test]
async fn test_full_pipeline_answers_with_citations() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);

    let sources = SourceTable::from_json_str(
        r#"[{"title": "Machine Guarding", "url": "https://example.org/machine-guarding"}]"#,
    )
    .unwrap();
    let engine = build_engine(InMemoryChunkStore::new(), &corpus, sources).await;

    let envelope = engine
        .ask("machine guarding moving parts", 3, SearchMode::Hybrid)
        .await
        .unwrap();

    assert!(!envelope.abstained);
    assert_eq!(envelope.reranker_used, "hybrid");
    assert!(!envelope.contexts.is_empty());
    assert!(envelope.contexts.len() <= 3);

    // Top context comes from the guarding document and carries its URL.
    let top = &envelope.contexts[0];
    assert_eq!(top.doc, "machine_guarding.txt");
    assert_eq!(top.url.as_deref(), Some("https://example.org/machine-guarding"));

    // The answer cites the top context, and no marker points past the
    // returned context list.
    let answer = envelope.answer.unwrap();
    assert!(answer.contains("[1]"));
    let phantom = format!("[{}]", envelope.contexts.len() + 1);
    assert!(!answer.contains(&phantom));
}

#[tokio::test]
async fn test_envelope_invariants_hold_in_both_modes() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);
    let engine = build_engine(InMemoryChunkStore::new(), &corpus, SourceTable::empty()).await;

    for mode in [SearchMode::Baseline, SearchMode::Hybrid] {
        let envelope = engine
            .ask("lockout tagout hazardous energy", 4, mode)
            .await
            .unwrap();

        // Ranks are dense and 1-based.
        for (i, context) in envelope.contexts.iter().enumerate() {
            assert_eq!(context.rank, i + 1);
        }
        // Scores descend and live in [0, 1].
        for pair in envelope.contexts.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for context in &envelope.contexts {
            assert!((0.0..=1.0).contains(&context.score));
            assert!(context.text.chars().count() <= 303); // preview + ellipsis
        }
        assert_eq!(envelope.reranker_used, mode.to_string());
    }
}

#[tokio::test]
async fn test_repeated_question_is_deterministic() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);
    let engine = build_engine(InMemoryChunkStore::new(), &corpus, SourceTable::empty()).await;

    let first = engine
        .ask("forklift operator training", 3, SearchMode::Hybrid)
        .await
        .unwrap();
    let second = engine
        .ask("forklift operator training", 3, SearchMode::Hybrid)
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rebuild_from_same_corpus_reproduces_results() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);

    let first_engine =
        build_engine(InMemoryChunkStore::new(), &corpus, SourceTable::empty()).await;
    let second_engine =
        build_engine(InMemoryChunkStore::new(), &corpus, SourceTable::empty()).await;

    let question = "stored energy before maintenance";
    let first = first_engine
        .ask(question, 3, SearchMode::Hybrid)
        .await
        .unwrap();
    let second = second_engine
        .ask(question, 3, SearchMode::Hybrid)
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_every_indexed_id_resolves_to_chunk_text() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);

    let store = InMemoryChunkStore::new();
    let params = ChunkParams::new(20, 5).unwrap();
    ingest_dir(&store, corpus.path(), &default_extractors(), &params)
        .await
        .unwrap();
    embed_all(&store, &HashEmbedder::new(DIM)).await.unwrap();

    // iter_embeddings is exactly the id set the engine indexes at load
    // time; every one of those ids must resolve to a stored chunk with
    // non-empty text.
    let embeddings = store.iter_embeddings().await.unwrap();
    assert!(!embeddings.is_empty());
    for (id, _) in embeddings {
        let record = store.get_chunk(id).await.unwrap();
        let record = record.unwrap_or_else(|| panic!("no chunk for indexed id {}", id.as_u64()));
        assert!(!record.text.trim().is_empty());
    }
}

#[tokio::test]
async fn test_empty_corpus_abstains() {
    let corpus = TempDir::new().unwrap();
    let engine = build_engine(InMemoryChunkStore::new(), &corpus, SourceTable::empty()).await;

    let envelope = engine
        .ask("anything at all", 5, SearchMode::Baseline)
        .await
        .unwrap();

    assert!(envelope.abstained);
    assert!(envelope.answer.is_none());
    assert!(envelope.contexts.is_empty());
}

#[tokio::test]
async fn test_threshold_separates_answer_from_abstention() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);

    let store = InMemoryChunkStore::new();
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let params = ChunkParams::new(20, 5).unwrap();
    ingest_dir(&store, corpus.path(), &default_extractors(), &params)
        .await
        .unwrap();
    embed_all(&store, &HashEmbedder::new(DIM)).await.unwrap();

    // Permissive policy answers.
    let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
        .await
        .unwrap()
        .with_policy(AbstainPolicy::new(0.0));
    let answered = engine
        .ask("machine guarding", 2, SearchMode::Hybrid)
        .await
        .unwrap();
    assert!(!answered.abstained);
    assert!(answered.answer.is_some());

    // Impossible policy abstains on the same question, but still reports
    // the evidence it declined to use.
    let strict = engine.with_policy(AbstainPolicy::new(1.1));
    let abstained = strict
        .ask("machine guarding", 2, SearchMode::Hybrid)
        .await
        .unwrap();
    assert!(abstained.abstained);
    assert!(abstained.answer.is_none());
    assert!(!abstained.contexts.is_empty());
}

#[tokio::test]
async fn test_k_larger_than_corpus_returns_all() {
    let corpus = TempDir::new().unwrap();
    fs::write(corpus.path().join("only.txt"), "One short document here.").unwrap();
    let engine = build_engine(InMemoryChunkStore::new(), &corpus, SourceTable::empty()).await;

    let envelope = engine
        .ask("short document", 10, SearchMode::Baseline)
        .await
        .unwrap();
    assert_eq!(envelope.contexts.len(), 1);
}

#[tokio::test]
async fn test_pipeline_over_redb_store() {
    let corpus = TempDir::new().unwrap();
    write_corpus(&corpus);

    let db_dir = TempDir::new().unwrap();
    let db_path = db_dir.path().join("chunks.redb");
    let params = ChunkParams::new(20, 5).unwrap();

    // Ingest into a redb store, drop it, reload from disk.
    {
        let store = RedbChunkStore::open(&db_path).unwrap();
        ingest_dir(&store, corpus.path(), &default_extractors(), &params)
            .await
            .unwrap();
        embed_all(&store, &HashEmbedder::new(DIM)).await.unwrap();
    }

    let store = RedbChunkStore::open(&db_path).unwrap();
    assert!(store.chunk_count().await.unwrap() > 0);

    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let engine = RetrievalEngine::load(store, embedder, SourceTable::empty())
        .await
        .unwrap();

    let envelope = engine
        .ask("pedestrians right of way", 2, SearchMode::Hybrid)
        .await
        .unwrap();
    assert!(!envelope.contexts.is_empty());
    assert_eq!(envelope.contexts[0].doc, "forklift_safety.txt");
}
