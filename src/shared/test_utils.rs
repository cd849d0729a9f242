//! Test utilities for pipeline and property-based tests
//!
//! Provides an in-memory [`DocumentStore`] that records every committed
//! transaction, a helper for building readings, and proptest generators for
//! raw device payloads.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{DocumentKey, GeoPoint, Measurements, NormalizedReading};
use crate::store::{DocumentStore, StoreError, MAX_CHUNK_SIZE};

/// In-memory document store with full-replace upserts
///
/// Commits are all-or-nothing, like the real store. A commit can be made to
/// fail on purpose with [`MemoryStore::fail_commit_number`].
#[derive(Debug)]
pub struct MemoryStore {
    documents: Mutex<HashMap<DocumentKey, NormalizedReading>>,
    commits: Mutex<Vec<Vec<DocumentKey>>>,
    attempts: Mutex<usize>,
    fail_on_attempt: Mutex<Option<usize>>,
    limit: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_limit(MAX_CHUNK_SIZE)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects transactions larger than `limit`
    pub fn with_limit(limit: usize) -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            commits: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail_on_attempt: Mutex::new(None),
            limit,
        }
    }

    /// Make the n-th commit attempt (1-based) fail
    pub fn fail_commit_number(&self, attempt: usize) {
        *self.fail_on_attempt.lock().unwrap() = Some(attempt);
    }

    /// Keys of each successful commit, in commit order
    pub fn commit_log(&self) -> Vec<Vec<DocumentKey>> {
        self.commits.lock().unwrap().clone()
    }

    /// Size of each successful commit, in commit order
    pub fn commit_sizes(&self) -> Vec<usize> {
        self.commits.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn get(&self, key: &str) -> Option<NormalizedReading> {
        self.documents.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit(
        &self,
        documents: &[(DocumentKey, NormalizedReading)],
    ) -> Result<(), StoreError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };

        if *self.fail_on_attempt.lock().unwrap() == Some(attempt) {
            return Err(StoreError::Transaction(format!(
                "simulated failure on commit {}",
                attempt
            )));
        }

        if documents.len() > self.limit {
            return Err(StoreError::ChunkTooLarge {
                size: documents.len(),
                limit: self.limit,
            });
        }

        let mut stored = self.documents.lock().unwrap();
        for (key, reading) in documents {
            stored.insert(key.clone(), reading.clone());
        }
        self.commits
            .lock()
            .unwrap()
            .push(documents.iter().map(|(key, _)| key.clone()).collect());

        Ok(())
    }

    fn max_transaction_ops(&self) -> usize {
        self.limit
    }
}

/// Valid normalized reading at the given coordinates
pub fn sample_reading(latitude: f64, longitude: f64) -> NormalizedReading {
    NormalizedReading {
        latitude,
        longitude,
        timestamp: 1705316400,
        position_point: GeoPoint::new(latitude, longitude),
        geohash: crate::normalize::encode_geohash(latitude, longitude).unwrap_or_default(),
        measurements: Measurements {
            co2: Some(400.0),
            ..Default::default()
        },
        device_label: "esp32".to_string(),
        original_identifier: None,
        device_date_time: None,
        received_at: "2024-01-15T11:00:00+00:00".to_string(),
    }
}

pub mod generators {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// Valid latitude in degrees
    pub fn latitude() -> impl Strategy<Value = f64> {
        -90.0f64..=90.0
    }

    /// Valid longitude in degrees
    pub fn longitude() -> impl Strategy<Value = f64> {
        -180.0f64..=180.0
    }

    /// A coordinate as a device might send it: JSON number or numeric string
    pub fn loose_number(range: std::ops::RangeInclusive<f64>) -> impl Strategy<Value = Value> {
        prop_oneof![
            range.clone().prop_map(|v| json!(v)),
            range.prop_map(|v| json!(v.to_string())),
        ]
    }

    /// A value that never coerces to a number
    pub fn non_numeric_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            Just(json!("")),
            Just(json!("bad")),
            Just(json!("NaN")),
            Just(json!("Infinity")),
            Just(json!(true)),
            Just(json!([1, 2])),
            Just(json!({"v": 1})),
            "[a-zA-Z]{1,12}".prop_map(Value::String),
        ]
    }

    /// Epoch seconds in a plausible range (up to the millisecond threshold)
    pub fn timestamp_seconds() -> impl Strategy<Value = i64> {
        1i64..=2_000_000_000
    }

    /// Epoch milliseconds above the millisecond threshold
    pub fn timestamp_millis() -> impl Strategy<Value = i64> {
        2_000_000_001i64..=4_102_444_800_000
    }

    /// Caller file identifier, including characters that need sanitizing
    pub fn file_identifier() -> impl Strategy<Value = String> {
        prop::string::string_regex("[A-Za-z0-9_./#?& -]{1,300}")
            .expect("Valid regex for file identifier")
            .prop_filter("identifier must not be blank", |s| !s.trim().is_empty())
    }

    /// Valid raw reading with optional identifier and measurements
    pub fn raw_reading() -> impl Strategy<Value = Value> {
        (
            latitude(),
            longitude(),
            prop::option::of(file_identifier()),
            prop::option::of(0.0f64..5000.0),
        )
            .prop_map(|(lat, lon, id, co2)| {
                let mut reading = json!({"lat": lat, "lng": lon});
                if let Some(id) = id {
                    reading["idArchivo"] = json!(id);
                }
                if let Some(co2) = co2 {
                    reading["co2"] = json!(co2);
                }
                reading
            })
    }
}
