//! Property tests for vector store search ordering.

mod common;

use std::sync::Arc;

use common::{chunk, test_config, HashEmbeddingProvider};
use proptest::prelude::*;
use vaidya_rag::VectorStore;

/// **Property: search ordering.** For any set of indexed chunks, searching
/// with any query returns results ordered by non-increasing similarity
/// score, bounded by both `top_k` and the number of stored entries.
mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            contents in proptest::collection::vec("[a-z ]{5,40}", 1..20),
            query in "[a-z ]{3,30}",
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let total = contents.len();
            let results = rt.block_on(async {
                let temp = tempfile::tempdir().unwrap();
                let config = test_config(&temp.path().join("store"));
                let store =
                    VectorStore::new(&config, Arc::new(HashEmbeddingProvider::new()));

                let chunks: Vec<_> = contents
                    .iter()
                    .enumerate()
                    .map(|(index, content)| chunk("corpus.txt", index, total, content))
                    .collect();
                assert!(store.add_documents(&chunks).await);

                store.search(&query, Some(top_k)).await
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= total);

            for window in results.windows(2) {
                prop_assert!(
                    window[0].similarity_score >= window[1].similarity_score,
                    "results not in descending order: {} < {}",
                    window[0].similarity_score,
                    window[1].similarity_score,
                );
            }
        }
    }
}
