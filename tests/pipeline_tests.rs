//! End-to-end ingestion tests: corpus directory → chunks → index → context.

mod common;

use std::fs;
use std::sync::Arc;

use common::{test_config, HashEmbeddingProvider};
use vaidya_rag::{IngestionPipeline, Retriever, VectorStore, NO_CONTEXT_FOUND};

fn pipeline_over(
    store_dir: &std::path::Path,
) -> (IngestionPipeline, Arc<VectorStore>) {
    let config = test_config(store_dir);
    let store = Arc::new(VectorStore::new(&config, Arc::new(HashEmbeddingProvider::new())));
    let pipeline = IngestionPipeline::builder()
        .config(config)
        .vector_store(store.clone())
        .build()
        .unwrap();
    (pipeline, store)
}

#[tokio::test]
async fn ingests_a_text_corpus_and_answers_queries() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(
        corpus.join("vata.txt"),
        "Vata imbalance shows as dry skin, cold hands, and restlessness.",
    )
    .unwrap();
    fs::write(
        corpus.join("pitta.txt"),
        "Pitta imbalance shows as heartburn, rashes, and irritability.",
    )
    .unwrap();

    let (pipeline, store) = pipeline_over(&temp.path().join("store"));
    let report = pipeline.ingest_directory(&corpus).await.unwrap();
    assert_eq!(report.documents_loaded, 2);
    assert_eq!(report.chunks_created, 2);
    assert_eq!(report.chunks_indexed, 2);
    assert!(!report.persisted);

    let retriever = Retriever::new(store);
    let context = retriever
        .get_relevant_context(
            "Vata imbalance shows as dry skin, cold hands, and restlessness.",
            Some(1),
        )
        .await;
    assert!(context.contains("Source: vata.txt"));
    assert!(context.contains("dry skin"));
}

#[tokio::test]
async fn corpus_chunk_counts_match_configured_windows() {
    // 200 / 1500 / 3000 character documents with chunk_size 1000 and
    // overlap 200 split into 1, 2, and 4 chunks.
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("small.txt"), "a".repeat(200)).unwrap();
    fs::write(corpus.join("medium.txt"), "b".repeat(1500)).unwrap();
    fs::write(corpus.join("large.txt"), "c".repeat(3000)).unwrap();

    let (pipeline, store) = pipeline_over(&temp.path().join("store"));
    let report = pipeline.ingest_directory(&corpus).await.unwrap();
    assert_eq!(report.documents_loaded, 3);
    assert_eq!(report.chunks_indexed, 7);

    let results = store.search(&"c".repeat(100), Some(100)).await;
    let large_chunks = results
        .iter()
        .filter(|result| result.metadata.source_file.as_deref() == Some("large.txt"))
        .count();
    assert_eq!(large_chunks, 4);
}

#[tokio::test]
async fn empty_corpus_yields_zeroed_report() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();

    let (pipeline, store) = pipeline_over(&temp.path().join("store"));
    let report = pipeline.ingest_directory(&corpus).await.unwrap();
    assert_eq!(report.documents_loaded, 0);
    assert_eq!(report.chunks_indexed, 0);

    let retriever = Retriever::new(store);
    assert_eq!(retriever.get_relevant_context("anything", None).await, NO_CONTEXT_FOUND);
}

#[tokio::test]
async fn rebuild_persists_and_ensure_ready_reloads() {
    let temp = tempfile::tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("agni.txt"), "Agni is the digestive fire of the body.").unwrap();
    let store_dir = temp.path().join("store");

    let (pipeline, store) = pipeline_over(&store_dir);
    let report = pipeline.rebuild(&corpus).await.unwrap();
    assert_eq!(report.chunks_indexed, 1);
    assert!(report.persisted);
    assert!(store.exists());

    // A fresh store over the same path comes up from disk, not from the
    // corpus.
    let (fresh_pipeline, fresh_store) = pipeline_over(&store_dir);
    fresh_pipeline.ensure_ready(&temp.path().join("missing-corpus")).await.unwrap();
    assert_eq!(fresh_store.get_document_count().await, 1);
}
