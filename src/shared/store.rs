use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DocumentKey, NormalizedReading};

/// Largest chunk ever sent as one transaction, regardless of the store
pub const MAX_CHUNK_SIZE: usize = 500;

/// Errors surfaced by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Transaction cancelled")]
    TransactionCancelled,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transaction of {size} operations exceeds limit of {limit}")]
    ChunkTooLarge { size: usize, limit: usize },
}

/// Transactional key → document collection holding normalized readings
///
/// Writes are full-replace upserts: an existing document under the same key
/// is overwritten entirely by the new reading.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Atomically upsert every `(key, reading)` pair, or none of them
    async fn commit(&self, documents: &[(DocumentKey, NormalizedReading)])
        -> Result<(), StoreError>;

    /// Hard limit on operations per transaction for this store
    fn max_transaction_ops(&self) -> usize {
        MAX_CHUNK_SIZE
    }
}
