use async_trait::async_trait;

use crate::{CartId, EventEnvelope, Result, SequenceNumber};

/// Options for appending events to the store.
#[derive(Debug, Clone, Default)]
pub struct AppendOptions {
    /// Expected sequence of the stream for optimistic concurrency control.
    /// If None, no expectation check is performed (use with caution).
    pub expected_sequence: Option<SequenceNumber>,
}

impl AppendOptions {
    /// Creates options with no expectation check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stream to be at a specific sequence.
    pub fn expect_sequence(seq: SequenceNumber) -> Self {
        Self {
            expected_sequence: Some(seq),
        }
    }

    /// Creates options expecting the stream to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_sequence: Some(SequenceNumber::initial()),
        }
    }
}

/// Core trait for event store implementations.
///
/// An event store is an append-only log of persisted events, keyed by
/// aggregate identity. All implementations must be thread-safe
/// (Send + Sync). Append and read are the only operations that may
/// suspend; callers must await completion before treating state as
/// durable.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events to their aggregate's stream.
    ///
    /// The batch is atomic: either every event persists or none do.
    /// Input order is preserved. If `options.expected_sequence` is set,
    /// the operation fails with `ConcurrencyConflict` when the stored
    /// sequence has advanced past the expectation. Independently of the
    /// expectation, a batch that does not continue the stream
    /// contiguously is rejected with `SequenceConflict`.
    ///
    /// Returns the stream's last sequence number after appending.
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<SequenceNumber>;

    /// Retrieves the full stream for an aggregate, in append order.
    ///
    /// Returns an empty vec when no events have been stored.
    async fn get_events(&self, aggregate_id: &CartId) -> Result<Vec<EventEnvelope>>;

    /// Returns the last sequence number stored for an aggregate.
    ///
    /// Returns `SequenceNumber::initial()` when the stream does not
    /// exist.
    async fn current_sequence(&self, aggregate_id: &CartId) -> Result<SequenceNumber>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Appends a single event to the store.
    async fn append_event(
        &self,
        event: EventEnvelope,
        options: AppendOptions,
    ) -> Result<SequenceNumber> {
        self.append(vec![event], options).await
    }

    /// Checks whether an aggregate has any stored events.
    async fn stream_exists(&self, aggregate_id: &CartId) -> Result<bool> {
        Ok(self.current_sequence(aggregate_id).await? > SequenceNumber::initial())
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Error returned when a batch is malformed before it reaches storage.
#[derive(Debug, Clone)]
pub struct AppendValidationError {
    pub message: String,
}

impl std::fmt::Display for AppendValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Append validation error: {}", self.message)
    }
}

impl std::error::Error for AppendValidationError {}

/// Validates a batch before appending.
///
/// The batch must be non-empty, target a single aggregate, and carry
/// contiguous ascending sequence numbers.
pub fn validate_events_for_append(
    events: &[EventEnvelope],
) -> std::result::Result<(), AppendValidationError> {
    if events.is_empty() {
        return Err(AppendValidationError {
            message: "Cannot append empty event list".to_string(),
        });
    }

    let first = &events[0];
    for event in events.iter().skip(1) {
        if event.aggregate_id != first.aggregate_id {
            return Err(AppendValidationError {
                message: "All events must be for the same aggregate".to_string(),
            });
        }
    }

    let mut expected = first.sequence_number;
    for event in events.iter().skip(1) {
        expected = expected.next();
        if event.sequence_number != expected {
            return Err(AppendValidationError {
                message: format!(
                    "Event sequence numbers must be contiguous. Expected {}, got {}",
                    expected, event.sequence_number
                ),
            });
        }
    }

    Ok(())
}
