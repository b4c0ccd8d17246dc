//! Domain error types.

use event_store::EventStoreError;
use thiserror::Error;

use crate::cart::CartError;

/// Errors that can occur during domain operations.
///
/// Every error propagates to the immediate caller; none are swallowed
/// and none terminate the process.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A cart command was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true if this error is a recoverable concurrency conflict.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::EventStore(EventStoreError::ConcurrencyConflict { .. })
        )
    }
}
