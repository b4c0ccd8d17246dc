//! Repository bridging aggregates and the event store.

use std::marker::PhantomData;

use common::CartId;
use event_store::{AppendOptions, EventEnvelope, EventStore, SequenceNumber};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Loads aggregates by replaying their stored history and saves them by
/// appending their uncommitted events.
///
/// The repository owns the envelope metadata: event IDs and timestamps
/// are assigned here at persistence time, and sequence numbers continue
/// from the aggregate's last persisted position so repeated save cycles
/// never restart numbering.
pub struct Repository<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    store: S,
    _phantom: PhantomData<A>,
}

impl<S, A> Repository<S, A>
where
    S: EventStore,
    A: Aggregate,
{
    /// Creates a new repository backed by the given event store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persists the aggregate's uncommitted events.
    ///
    /// A no-op when the buffer is empty. Otherwise each domain event is
    /// wrapped in a persisted envelope and the batch is appended with
    /// the aggregate's last persisted sequence as the concurrency
    /// expectation. The buffer is cleared only once the append has been
    /// confirmed; on failure it is left intact so a retry resends
    /// exactly the same pending events.
    ///
    /// Returns the stream's sequence number after the save.
    #[tracing::instrument(skip(self, aggregate))]
    pub async fn save(
        &self,
        aggregate_id: &CartId,
        aggregate: &mut A,
    ) -> Result<SequenceNumber, DomainError> {
        let pending = aggregate.uncommitted_events();
        if pending.is_empty() {
            return Ok(aggregate.sequence());
        }

        let envelopes = self.build_envelopes(aggregate_id, aggregate.sequence(), pending)?;
        let options = AppendOptions::expect_sequence(aggregate.sequence());

        let new_sequence = self.store.append(envelopes, options).await?;

        aggregate.mark_events_as_committed();
        aggregate.set_sequence(new_sequence);

        tracing::debug!(%aggregate_id, sequence = %new_sequence, "aggregate saved");

        Ok(new_sequence)
    }

    /// Loads an aggregate by replaying its stored event sequence.
    ///
    /// Returns None when no events have been stored for the identity.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, aggregate_id: &CartId) -> Result<Option<A>, DomainError> {
        let envelopes = self.store.get_events(aggregate_id).await?;
        if envelopes.is_empty() {
            return Ok(None);
        }

        let last_sequence = envelopes
            .last()
            .map(|e| e.sequence_number)
            .unwrap_or_else(SequenceNumber::initial);

        let mut events = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            let event: A::Event = serde_json::from_value(envelope.payload)?;
            events.push(event);
        }

        let mut aggregate = A::from_history(events);
        aggregate.set_sequence(last_sequence);

        Ok(Some(aggregate))
    }

    /// Builds persisted envelopes from domain events, numbering them as
    /// a contiguous continuation of the stream.
    fn build_envelopes(
        &self,
        aggregate_id: &CartId,
        current_sequence: SequenceNumber,
        events: &[A::Event],
    ) -> Result<Vec<EventEnvelope>, DomainError> {
        let mut envelopes = Vec::with_capacity(events.len());
        let mut sequence = current_sequence;

        for event in events {
            sequence = sequence.next();
            let envelope = EventEnvelope::builder()
                .aggregate_id(aggregate_id.clone())
                .event_type(event.event_type())
                .sequence_number(sequence)
                .payload(event)?
                .build();
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}
