use thiserror::Error;

use crate::{CartId, SequenceNumber};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// A concurrency conflict occurred when appending events.
    /// The expected stream sequence did not match the actual sequence.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected sequence {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: CartId,
        expected: SequenceNumber,
        actual: SequenceNumber,
    },

    /// The batch does not continue the stream contiguously: its first
    /// sequence number collides with or leaves a gap after the stored
    /// stream.
    #[error(
        "Sequence conflict for aggregate {aggregate_id}: stream continues at {expected}, batch starts at {found}"
    )]
    SequenceConflict {
        aggregate_id: CartId,
        expected: SequenceNumber,
        found: SequenceNumber,
    },

    /// The batch was malformed before reaching storage.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// The durable write could not complete.
    #[error("Append failed: {0}")]
    AppendFailed(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
