//! Core aggregate and domain event traits.

use event_store::SequenceNumber;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type discriminator.
    ///
    /// This is the value stored in the persisted envelope's `event_type`
    /// field.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate's observable state is entirely derived by folding its
/// ordered event sequence. Commands validate business rules, emit new
/// events, apply them through [`Aggregate::apply`], and keep them in an
/// uncommitted buffer until a repository confirms persistence.
///
/// The same `apply` implementation serves both the command path (via
/// [`Aggregate::record`]) and the replay path
/// ([`Aggregate::from_history`]), so live-mutated state and replayed
/// state cannot diverge.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate's commands can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    fn aggregate_type() -> &'static str;

    /// Applies an event to the aggregate, updating its state.
    ///
    /// This method must be pure and deterministic:
    /// - Given the same state and event, it must always produce the same
    ///   new state
    /// - It must not have side effects
    /// - It must not fail (events represent facts that have happened)
    fn apply(&mut self, event: Self::Event);

    /// Applies an event and records it in the uncommitted buffer.
    ///
    /// Command methods call this after validation; replay never does.
    fn record(&mut self, event: Self::Event);

    /// Returns a read-only view of the events recorded since the last
    /// successful save. Does not clear the buffer.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears the uncommitted buffer.
    ///
    /// Called by the repository once an append has been confirmed.
    /// Calling it without a prior successful append loses events; that
    /// obligation rests on the caller, not on the aggregate.
    fn mark_events_as_committed(&mut self);

    /// Returns the last persisted sequence number for this aggregate.
    ///
    /// `SequenceNumber::initial()` for a fresh aggregate. Advanced by
    /// the repository on load and on successful save, never by commands.
    fn sequence(&self) -> SequenceNumber;

    /// Sets the last persisted sequence number.
    fn set_sequence(&mut self, sequence: SequenceNumber);

    /// Rebuilds an aggregate by folding an ordered event sequence from
    /// the empty state.
    ///
    /// The replayed events are not re-buffered; the resulting aggregate
    /// has an empty uncommitted buffer.
    fn from_history(events: impl IntoIterator<Item = Self::Event>) -> Self {
        let mut aggregate = Self::default();
        for event in events {
            aggregate.apply(event);
        }
        aggregate
    }
}
