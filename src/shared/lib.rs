// Declare modules at the root level
pub mod batch_writer;
pub mod coercion;
pub mod document_key;
pub mod domain;
pub mod error;
pub mod ingestion;
pub mod normalize;
pub mod store;
pub mod time;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::batch_writer;
    pub use super::coercion;
    pub use super::document_key;
    pub use super::domain;
    pub use super::error;
    pub use super::ingestion;
    pub use super::normalize;
    pub use super::store;
    pub use super::time;
}

// Also re-export at root for convenience
pub use batch_writer::*;
pub use document_key::*;
pub use domain::*;
pub use error::*;
pub use ingestion::*;
pub use normalize::*;
pub use store::*;
pub use time::*;
