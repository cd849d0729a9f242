//! Batch ingestion pipeline
//!
//! Each item of a batch is normalized and keyed on its own; a bad item is
//! counted as skipped and never aborts the batch. Surviving readings are
//! written through [`write_batch`] in store-sized transactions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::batch_writer::write_batch;
use crate::document_key::KeyAssigner;
use crate::domain::{DocumentKey, NormalizedReading};
use crate::normalize::{normalize_reading, InvalidReading};
use crate::store::{DocumentStore, StoreError};
use crate::time::Clock;

/// Result of processing one batch item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Reading is valid and waits for its document key
    Ready(NormalizedReading),
    /// Item is skipped
    Skipped(SkipReason),
}

/// Why an item was left out of the batch
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NotAnObject,
    Invalid(InvalidReading),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "item is not a JSON object"),
            SkipReason::Invalid(reason) => write!(f, "{}", reason),
        }
    }
}

/// Accepted identifiers and skip count for one batch
///
/// This is also the success body of `POST /mediciones`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub accepted: Vec<String>,
    pub skipped: usize,
}

/// Normalize a single raw item
pub fn process_item(item: &Value, default_device_label: &str, clock: &dyn Clock) -> ItemOutcome {
    let Some(raw) = item.as_object() else {
        return ItemOutcome::Skipped(SkipReason::NotAnObject);
    };

    match normalize_reading(raw, default_device_label, clock) {
        Ok(reading) => ItemOutcome::Ready(reading),
        Err(reason) => ItemOutcome::Skipped(SkipReason::Invalid(reason)),
    }
}

struct PendingWrite {
    key: DocumentKey,
    ack_id: String,
    reading: NormalizedReading,
}

/// Run the full pipeline for one batch of raw items
///
/// The store is contacted only when at least one item survives. On store
/// failure the error is returned as-is and no partial outcome is reported.
pub async fn ingest_batch(
    items: &[Value],
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    default_device_label: &str,
) -> Result<IngestOutcome, StoreError> {
    if items.is_empty() {
        return Ok(IngestOutcome::default());
    }

    let outcomes: Vec<ItemOutcome> = items
        .iter()
        .map(|item| process_item(item, default_device_label, clock))
        .collect();

    let ready = outcomes.iter().filter_map(|outcome| match outcome {
        ItemOutcome::Ready(reading) => Some(reading),
        ItemOutcome::Skipped(_) => None,
    });
    let mut assigner = KeyAssigner::for_batch(ready);
    let mut pending: Vec<PendingWrite> = Vec::with_capacity(items.len());
    let mut by_key: HashMap<DocumentKey, usize> = HashMap::new();
    let mut skipped = 0;

    for (index, outcome) in outcomes.into_iter().enumerate() {
        let reading = match outcome {
            ItemOutcome::Ready(reading) => reading,
            ItemOutcome::Skipped(reason) => {
                warn!(index, reason = %reason, "Skipping reading");
                skipped += 1;
                continue;
            }
        };

        let assigned = assigner.assign(&reading, clock);
        let write = PendingWrite {
            key: assigned.key,
            ack_id: assigned.ack_id,
            reading,
        };

        // Same key twice in one batch: the later item wins
        if let Some(&slot) = by_key.get(&write.key) {
            let superseded = std::mem::replace(&mut pending[slot], write);
            if superseded.ack_id != pending[slot].ack_id {
                warn!(
                    index,
                    key = %pending[slot].key,
                    superseded = %superseded.ack_id,
                    "Reading superseded by a later item with the same key"
                );
                skipped += 1;
            }
            continue;
        }

        by_key.insert(write.key.clone(), pending.len());
        pending.push(write);
    }

    if pending.is_empty() {
        info!(skipped, "No valid readings in batch");
        return Ok(IngestOutcome {
            accepted: Vec::new(),
            skipped,
        });
    }

    let mut accepted = Vec::with_capacity(pending.len());
    let mut documents = Vec::with_capacity(pending.len());
    for write in pending {
        accepted.push(write.ack_id);
        documents.push((write.key, write.reading));
    }

    let summary = write_batch(store, &documents).await?;

    info!(
        written = summary.documents,
        chunks = summary.chunks,
        skipped,
        "Batch ingested"
    );

    Ok(IngestOutcome { accepted, skipped })
}
