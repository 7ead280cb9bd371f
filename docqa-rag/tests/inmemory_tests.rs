//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use docqa_rag::document::Chunk;
use docqa_rag::inmemory::InMemoryVectorStore;
use docqa_rag::mmr::mmr_select;
use docqa_rag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a list of chunks, each paired with a normalized embedding.
fn arb_entries(dim: usize) -> impl Strategy<Value = Vec<(Chunk, Vec<f32>)>> {
    proptest::collection::vec(("[a-z ]{5,30}", arb_normalized_embedding(dim)), 1..20).prop_map(
        |items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (text, embedding))| {
                    let chunk = Chunk {
                        id: format!("doc_1_{i}"),
                        text,
                        metadata: HashMap::new(),
                        document_id: "doc_1".to_string(),
                    };
                    (chunk, embedding)
                })
                .collect()
        },
    )
}

/// **Property: similarity search ordering**
/// *For any* set of embedded chunks, searching with a query embedding returns
/// results ordered by ascending cosine distance, and at most `top_k` of them.
mod prop_inmemory_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_by_distance_and_bounded_by_top_k(
            entries in arb_entries(DIM),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let stored = entries.len();
            let store = InMemoryVectorStore::from_entries(DIM, entries).unwrap();

            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(store.search(&query, top_k)).unwrap();

            // Result count is at most top_k and at most the number of stored chunks
            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(stored));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].distance() <= window[1].distance(),
                    "results not in ascending distance order: {} > {}",
                    window[0].distance(),
                    window[1].distance(),
                );
            }
        }
    }
}

/// **Property: MMR selects distinct chunks**
/// *For any* candidate set, MMR returns `min(k, candidates)` results with no
/// chunk selected twice, and with `lambda = 1.0` it agrees with plain search.
mod prop_mmr_selection {
    use super::*;

    const DIM: usize = 8;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn mmr_returns_distinct_chunks(
            entries in arb_entries(DIM),
            query in arb_normalized_embedding(DIM),
            k in 1usize..10,
            lambda in 0.0f32..=1.0f32,
        ) {
            let store = InMemoryVectorStore::from_entries(DIM, entries).unwrap();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let candidates = rt.block_on(store.candidates(&query, 20)).unwrap();
            let candidate_count = candidates.len();

            let selected = mmr_select(&query, candidates, k, lambda);
            prop_assert_eq!(selected.len(), k.min(candidate_count));

            let mut ids: Vec<&str> = selected.iter().map(|r| r.chunk.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), selected.len());
        }

        #[test]
        fn mmr_with_full_relevance_matches_search(
            entries in arb_entries(DIM),
            query in arb_normalized_embedding(DIM),
            k in 1usize..10,
        ) {
            let store = InMemoryVectorStore::from_entries(DIM, entries).unwrap();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (candidates, plain) = rt.block_on(async {
                (store.candidates(&query, 20).await.unwrap(), store.search(&query, k).await.unwrap())
            });

            let selected = mmr_select(&query, candidates, k, 1.0);
            let selected_scores: Vec<f32> = selected.iter().map(|r| r.score).collect();
            let plain_scores: Vec<f32> = plain.iter().map(|r| r.score).collect();
            prop_assert_eq!(selected_scores.len(), plain_scores.len());
            for (a, b) in selected_scores.iter().zip(&plain_scores) {
                prop_assert!((a - b).abs() < 1e-5);
            }
        }
    }
}
