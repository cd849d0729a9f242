use tracing::info;

use crate::domain::{DocumentKey, NormalizedReading};
use crate::store::{DocumentStore, StoreError, MAX_CHUNK_SIZE};

/// Counts reported after a batch has been fully committed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteSummary {
    pub chunks: usize,
    pub documents: usize,
}

/// Effective chunk size for a store: the global cap or the store's own limit
pub fn chunk_size(store: &dyn DocumentStore) -> usize {
    store.max_transaction_ops().clamp(1, MAX_CHUNK_SIZE)
}

/// Commit documents in consecutive, size-bounded transactions
///
/// Chunks are committed in order, each awaited before the next starts. The
/// first failing chunk aborts the write; chunks committed before it stay
/// committed. Re-running the same batch is safe since every write is a
/// keyed upsert.
pub async fn write_batch(
    store: &dyn DocumentStore,
    documents: &[(DocumentKey, NormalizedReading)],
) -> Result<WriteSummary, StoreError> {
    let size = chunk_size(store);
    let mut summary = WriteSummary::default();

    for chunk in documents.chunks(size) {
        store.commit(chunk).await?;
        summary.chunks += 1;
        summary.documents += chunk.len();

        info!(
            chunk = summary.chunks,
            chunk_size = chunk.len(),
            committed = summary.documents,
            total = documents.len(),
            "Committed chunk"
        );
    }

    Ok(summary)
}
