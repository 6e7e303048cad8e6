//! Property tests: arbitrary add/update/delete sequences keep records and index aligned,
//! ids unique, and survive a save/reopen cycle unchanged.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use ragdb_vector_store::{Document, DocumentStore, RebuildStrategy, StoreConfig, StubEmbedder};
use tempfile::TempDir;

const DIM: usize = 16;

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Update(usize, String),
    Delete(usize),
}

fn arb_text() -> impl Strategy<Value = String> {
    "[a-z]{2,6}( [a-z]{2,6}){0,4}"
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_text().prop_map(Op::Add),
        1 => (any::<usize>(), arb_text()).prop_map(|(i, t)| Op::Update(i, t)),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

async fn open(dir: &TempDir, rebuild: RebuildStrategy) -> DocumentStore {
    let config = StoreConfig::new(DIM, dir.path().join("store.json")).with_rebuild(rebuild);
    DocumentStore::open_with_config(config, Arc::new(StubEmbedder::new(DIM)))
        .await
        .unwrap()
}

async fn check_invariants(store: &DocumentStore) {
    let stats = store.stats().await;
    assert!(stats.is_aligned(), "misaligned: {stats:?}");

    let entries = store.list(0, usize::MAX).await;
    assert_eq!(entries.len(), stats.documents);
    let ids: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids.len(), entries.len(), "duplicate ids");

    // Every stored text is its own nearest neighbor.
    if let Some(entry) = entries.last() {
        let hits = store.search(&entry.document.text, 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].distance.abs() < 1e-6);
        assert_eq!(hits[0].text, entry.document.text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn mutations_preserve_alignment_and_roundtrip(
        ops in proptest::collection::vec(arb_op(), 1..24),
        reuse in any::<bool>(),
    ) {
        let rebuild = if reuse {
            RebuildStrategy::ReuseVectors
        } else {
            RebuildStrategy::ReembedAll
        };
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = TempDir::new().unwrap();
            let store = open(&dir, rebuild).await;
            let mut live: Vec<String> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(text) => live.push(store.add(Document::new(text)).await.unwrap()),
                    Op::Update(pick, text) if !live.is_empty() => {
                        let id = &live[pick % live.len()];
                        assert!(store.update(id, text.clone(), None).await.unwrap());
                        assert_eq!(store.get(id).await.unwrap().text, text);
                    }
                    Op::Delete(pick) if !live.is_empty() => {
                        let id = live.remove(pick % live.len());
                        assert!(store.delete(&id).await.unwrap());
                        assert!(store.get(&id).await.is_none());
                    }
                    Op::Update(..) | Op::Delete(_) => {}
                }
                check_invariants(&store).await;
            }

            let listed: Vec<String> =
                store.list(0, usize::MAX).await.into_iter().map(|e| e.id).collect();
            assert_eq!(listed, live);

            let query = "sample query words";
            let before = store.search(query, 5).await.unwrap();
            let before_entries = store.list(0, usize::MAX).await;
            drop(store);

            let reopened = open(&dir, rebuild).await;
            assert_eq!(reopened.list(0, usize::MAX).await, before_entries);
            assert_eq!(reopened.search(query, 5).await.unwrap(), before);
        });
    }
}
