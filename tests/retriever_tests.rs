//! Integration tests for retrieval, context formatting, and filtering.

mod common;

use std::sync::Arc;

use common::{chunk, test_config, FlakyEmbeddingProvider, HashEmbeddingProvider};
use vaidya_rag::{Retriever, VectorStore, CONTEXT_ERROR, NO_CONTEXT_FOUND};

fn seeded_chunks() -> Vec<vaidya_rag::Chunk> {
    vec![
        chunk("vata_guide.txt", 0, 2, "Vata imbalance shows as dry skin and restlessness."),
        chunk("vata_guide.txt", 1, 2, "Routine and warm food ground excess vata."),
        chunk("pitta_guide.txt", 0, 1, "Pitta excess brings heartburn and irritability."),
        chunk("kapha_guide.txt", 0, 1, "Kapha excess brings lethargy and congestion."),
    ]
}

async fn seeded_retriever(store_dir: &std::path::Path) -> (Retriever, Arc<VectorStore>) {
    let config = test_config(store_dir);
    let store = Arc::new(VectorStore::new(&config, Arc::new(HashEmbeddingProvider::new())));
    assert!(store.add_documents(&seeded_chunks()).await);
    (Retriever::new(store.clone()), store)
}

#[tokio::test]
async fn retrieve_reshapes_results_with_source() {
    let temp = tempfile::tempdir().unwrap();
    let (retriever, _store) = seeded_retriever(&temp.path().join("store")).await;

    let results =
        retriever.retrieve("Vata imbalance shows as dry skin and restlessness.", Some(3)).await;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].source, "vata_guide.txt");
    assert!(results[0].score >= results[1].score);
    assert!(results.iter().all(|result| !result.source.is_empty()));
}

#[tokio::test]
async fn retrieve_on_uninitialized_store_is_empty() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp.path().join("store"));
    let store = Arc::new(VectorStore::new(&config, Arc::new(HashEmbeddingProvider::new())));
    let retriever = Retriever::new(store);

    assert!(!retriever.is_initialized().await);
    assert!(retriever.retrieve("anything", None).await.is_empty());
    assert_eq!(retriever.get_relevant_context("anything", None).await, NO_CONTEXT_FOUND);
}

#[tokio::test]
async fn context_is_formatted_as_numbered_blocks() {
    let temp = tempfile::tempdir().unwrap();
    let (retriever, _store) = seeded_retriever(&temp.path().join("store")).await;

    let context =
        retriever.get_relevant_context("Vata imbalance shows as dry skin and restlessness.", Some(2)).await;
    assert!(context.starts_with("Document 1 (Source: vata_guide.txt, Relevance: 1.000):\n"));
    assert!(context.contains("Vata imbalance shows as dry skin and restlessness."));
    assert!(context.contains("\n\nDocument 2 (Source: "));
}

#[tokio::test]
async fn context_error_is_distinct_from_no_context() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp.path().join("store"));
    let provider = Arc::new(FlakyEmbeddingProvider::new());
    let store = Arc::new(VectorStore::new(&config, provider.clone()));
    store.add_documents(&seeded_chunks()).await;
    let retriever = Retriever::new(store);

    provider.arm();
    let context = retriever.get_relevant_context("anything", None).await;
    assert_eq!(context, CONTEXT_ERROR);
    assert_ne!(CONTEXT_ERROR, NO_CONTEXT_FOUND);
}

#[tokio::test]
async fn score_filter_returns_an_ordered_subset() {
    let temp = tempfile::tempdir().unwrap();
    let (retriever, _store) = seeded_retriever(&temp.path().join("store")).await;
    let query = "Routine and warm food ground excess vata.";

    let unfiltered = retriever.retrieve(query, None).await;
    let filtered = retriever.retrieve_with_filters(query, None, 0.5, None).await;

    assert!(!filtered.is_empty());
    assert!(filtered.len() <= unfiltered.len());
    assert!(filtered.iter().all(|result| result.score >= 0.5));

    // Every filtered result appears in the unfiltered list, in the same
    // relative order.
    let mut cursor = 0;
    for result in &filtered {
        let position = unfiltered[cursor..]
            .iter()
            .position(|candidate| candidate.content == result.content)
            .expect("filtered result missing from unfiltered results");
        cursor += position + 1;
    }
}

#[tokio::test]
async fn source_filter_is_case_insensitive_substring() {
    let temp = tempfile::tempdir().unwrap();
    let (retriever, _store) = seeded_retriever(&temp.path().join("store")).await;
    let query = "excess symptoms";

    let vata_only = retriever.retrieve_with_filters(query, Some("VATA"), 0.0, Some(10)).await;
    assert!(!vata_only.is_empty());
    assert!(vata_only.iter().all(|result| result.source == "vata_guide.txt"));

    let none = retriever.retrieve_with_filters(query, Some("unani"), 0.0, Some(10)).await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn retrieval_statistics_summarize_scores_and_sources() {
    let temp = tempfile::tempdir().unwrap();
    let (retriever, _store) = seeded_retriever(&temp.path().join("store")).await;

    let stats = retriever.get_retrieval_statistics("dry skin and congestion").await;
    assert!(stats.total_results > 0);
    let (minimum, maximum) = stats.score_range;
    assert!(minimum <= stats.average_score && stats.average_score <= maximum);
    assert_eq!(stats.unique_sources, stats.sources.len());
    assert!(stats.unique_sources <= 3);
}

#[tokio::test]
async fn retrieval_statistics_default_to_zero_when_empty() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(&temp.path().join("store"));
    let store = Arc::new(VectorStore::new(&config, Arc::new(HashEmbeddingProvider::new())));
    let retriever = Retriever::new(store);

    let stats = retriever.get_retrieval_statistics("anything").await;
    assert_eq!(stats.total_results, 0);
    assert_eq!(stats.average_score, 0.0);
    assert_eq!(stats.score_range, (0.0, 0.0));
    assert!(stats.sources.is_empty());
    assert_eq!(stats.unique_sources, 0);
}

#[tokio::test]
async fn is_initialized_tracks_store_state() {
    let temp = tempfile::tempdir().unwrap();
    let (retriever, store) = seeded_retriever(&temp.path().join("store")).await;
    assert!(retriever.is_initialized().await);

    store.clear().await;
    assert!(!retriever.is_initialized().await);
}
