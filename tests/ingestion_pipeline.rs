// Pipeline tests for batch ingestion
//
// These tests run the full normalize → key → chunked write pipeline against
// the in-memory store:
// - Chunking of large batches into store-sized transactions
// - Idempotent re-delivery with stable identifiers
// - Partial failure when a later chunk fails to commit

use mediciones_backend::test_utils::{generators, MemoryStore};
use mediciones_backend::{ingest_batch, FixedClock, StoreError, DEFAULT_DEVICE_LABEL};
use proptest::prelude::*;
use serde_json::{json, Value};

fn clock() -> FixedClock {
    FixedClock::from_epoch_millis(1705316400123)
}

fn valid_items(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"lat": 10, "lng": 20, "co2": i, "idArchivo": format!("file-{}.txt", i)}))
        .collect()
}

#[tokio::test]
async fn test_501_items_two_transactions() {
    let store = MemoryStore::new();
    let outcome = ingest_batch(&valid_items(501), &store, &clock(), DEFAULT_DEVICE_LABEL)
        .await
        .unwrap();

    assert_eq!(outcome.accepted.len(), 501);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(store.commit_sizes(), vec![500, 1]);
    assert_eq!(store.commit_log()[1], vec!["file-500.txt".to_string()]);
}

#[tokio::test]
async fn test_accepted_preserves_input_order() {
    let store = MemoryStore::new();
    let items = valid_items(5);
    let outcome = ingest_batch(&items, &store, &clock(), DEFAULT_DEVICE_LABEL)
        .await
        .unwrap();

    let expected: Vec<String> = (0..5).map(|i| format!("file-{}.txt", i)).collect();
    assert_eq!(outcome.accepted, expected);
}

#[tokio::test]
async fn test_resubmission_is_idempotent() {
    let store = MemoryStore::new();
    let first = vec![json!({"lat": 10, "lng": 20, "co2": 400, "idArchivo": "f1.txt"})];
    let second = vec![json!({"lat": 10, "lng": 20, "co2": 415, "idArchivo": "f1.txt"})];

    let a = ingest_batch(&first, &store, &clock(), DEFAULT_DEVICE_LABEL).await.unwrap();
    let b = ingest_batch(&second, &store, &clock(), DEFAULT_DEVICE_LABEL).await.unwrap();

    assert_eq!(a.accepted, b.accepted);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("f1.txt").unwrap().measurements.co2, Some(415.0));
}

#[tokio::test]
async fn test_failed_second_chunk_keeps_first_committed() {
    let store = MemoryStore::new();
    store.fail_commit_number(2);

    let result = ingest_batch(&valid_items(501), &store, &clock(), DEFAULT_DEVICE_LABEL).await;

    assert!(matches!(result, Err(StoreError::Transaction(_))));
    assert_eq!(store.commit_sizes(), vec![500]);
    assert_eq!(store.len(), 500);

    // Retrying the whole batch completes it without duplicates
    let outcome = ingest_batch(&valid_items(501), &store, &clock(), DEFAULT_DEVICE_LABEL)
        .await
        .unwrap();
    assert_eq!(outcome.accepted.len(), 501);
    assert_eq!(store.len(), 501);
}

#[tokio::test]
async fn test_mixed_batch_counts() {
    let store = MemoryStore::new();
    let items = vec![
        json!({"lat": 10, "lng": 20, "idArchivo": "ok-1"}),
        json!({"lat": "bad", "co2": 5}),
        json!("not an object"),
        json!({"latitud": "10.5", "lon": "20.5", "idArchivo": "ok-2"}),
    ];

    let outcome = ingest_batch(&items, &store, &clock(), DEFAULT_DEVICE_LABEL)
        .await
        .unwrap();

    assert_eq!(outcome.accepted, vec!["ok-1".to_string(), "ok-2".to_string()]);
    assert_eq!(outcome.skipped, 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: invalid items are always skipped and every accepted id is stored
    #[test]
    fn prop_every_item_accounted_for(
        valid in prop::collection::vec(generators::raw_reading(), 0..30),
        invalid in prop::collection::vec(generators::non_numeric_value(), 0..10),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let store = MemoryStore::new();

        let items: Vec<Value> = valid
            .iter()
            .cloned()
            .chain(invalid.iter().map(|v| json!({"lat": v, "lng": v})))
            .collect();

        let outcome = runtime
            .block_on(ingest_batch(&items, &store, &clock(), DEFAULT_DEVICE_LABEL))
            .unwrap();

        prop_assert!(outcome.skipped >= invalid.len());
        // Repeats of one identifier collapse into a single accepted id
        prop_assert!(outcome.accepted.len() + outcome.skipped <= items.len());
        prop_assert_eq!(store.len(), outcome.accepted.len());
    }
}
