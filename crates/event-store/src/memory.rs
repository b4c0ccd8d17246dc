use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    CartId, EventEnvelope, EventStoreError, Result, SequenceNumber,
    store::{AppendOptions, EventStore, validate_events_for_append},
};

/// In-memory event store implementation.
///
/// Streams are kept per aggregate in append order. Clones share the
/// underlying log, so a single long-lived handle can be passed to every
/// component that needs it.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<CartId, Vec<EventEnvelope>>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored across all streams.
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }

    /// Clears all streams.
    pub async fn clear(&self) {
        self.streams.write().await.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        events: Vec<EventEnvelope>,
        options: AppendOptions,
    ) -> Result<SequenceNumber> {
        validate_events_for_append(&events)
            .map_err(|e| EventStoreError::InvalidBatch(e.message))?;

        let aggregate_id = events[0].aggregate_id.clone();

        // The write lock is held across check-and-extend so the batch is
        // atomic with respect to concurrent appends.
        let mut streams = self.streams.write().await;
        let stream = streams.entry(aggregate_id.clone()).or_default();

        let current = stream
            .last()
            .map(|e| e.sequence_number)
            .unwrap_or_else(SequenceNumber::initial);

        if let Some(expected) = options.expected_sequence
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        // Unique/gapless constraint: the batch must continue the stream.
        let first_new = events[0].sequence_number;
        if first_new != current.next() {
            return Err(EventStoreError::SequenceConflict {
                aggregate_id,
                expected: current.next(),
                found: first_new,
            });
        }

        let last = events
            .last()
            .map(|e| e.sequence_number)
            .unwrap_or(current);
        let count = events.len();
        stream.extend(events);

        tracing::debug!(%aggregate_id, count, last_sequence = %last, "appended events");

        Ok(last)
    }

    async fn get_events(&self, aggregate_id: &CartId) -> Result<Vec<EventEnvelope>> {
        let streams = self.streams.read().await;
        Ok(streams.get(aggregate_id).cloned().unwrap_or_default())
    }

    async fn current_sequence(&self, aggregate_id: &CartId) -> Result<SequenceNumber> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(aggregate_id)
            .and_then(|stream| stream.last())
            .map(|e| e.sequence_number)
            .unwrap_or_else(SequenceNumber::initial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EventStoreExt;

    fn create_test_event(aggregate_id: &CartId, seq: SequenceNumber) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id.clone())
            .event_type("ItemAddedToCart")
            .sequence_number(seq)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");
        let event = create_test_event(&aggregate_id, SequenceNumber::first());

        let result = store.append(vec![event], AppendOptions::expect_new()).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), SequenceNumber::first());

        let events = store.get_events(&aggregate_id).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn append_multiple_events() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let events = vec![
            create_test_event(&aggregate_id, SequenceNumber::new(1)),
            create_test_event(&aggregate_id, SequenceNumber::new(2)),
            create_test_event(&aggregate_id, SequenceNumber::new(3)),
        ];

        let result = store.append(events, AppendOptions::expect_new()).await;
        assert_eq!(result.unwrap(), SequenceNumber::new(3));

        let stored = store.get_events(&aggregate_id).await.unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn append_preserves_input_order() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let events: Vec<_> = (1..=5)
            .map(|seq| create_test_event(&aggregate_id, SequenceNumber::new(seq)))
            .collect();
        let ids: Vec<_> = events.iter().map(|e| e.event_id).collect();

        store.append(events, AppendOptions::expect_new()).await.unwrap();

        let stored = store.get_events(&aggregate_id).await.unwrap();
        let stored_ids: Vec<_> = stored.iter().map(|e| e.event_id).collect();
        assert_eq!(stored_ids, ids);
    }

    #[tokio::test]
    async fn empty_stream_returns_no_events() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-missing");

        let events = store.get_events(&aggregate_id).await.unwrap();
        assert!(events.is_empty());
        assert_eq!(
            store.current_sequence(&aggregate_id).await.unwrap(),
            SequenceNumber::initial()
        );
    }

    #[tokio::test]
    async fn concurrency_conflict_on_stale_expectation() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let event1 = create_test_event(&aggregate_id, SequenceNumber::first());
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        // A second writer still believes the stream is empty.
        let event2 = create_test_event(&aggregate_id, SequenceNumber::first());
        let result = store.append(vec![event2], AppendOptions::expect_new()).await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));

        // The conflicting batch must not have been stored.
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn append_with_correct_expectation_succeeds() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let event1 = create_test_event(&aggregate_id, SequenceNumber::first());
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let event2 = create_test_event(&aggregate_id, SequenceNumber::new(2));
        let result = store
            .append(
                vec![event2],
                AppendOptions::expect_sequence(SequenceNumber::first()),
            )
            .await;

        assert_eq!(result.unwrap(), SequenceNumber::new(2));
    }

    #[tokio::test]
    async fn sequence_conflict_on_batch_restarting_at_one() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let events = vec![
            create_test_event(&aggregate_id, SequenceNumber::new(1)),
            create_test_event(&aggregate_id, SequenceNumber::new(2)),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        // A batch renumbered from 1 collides with the stored events even
        // when no expectation is supplied.
        let colliding = vec![create_test_event(&aggregate_id, SequenceNumber::new(1))];
        let result = store.append(colliding, AppendOptions::new()).await;

        assert!(matches!(
            result,
            Err(EventStoreError::SequenceConflict { .. })
        ));
    }

    #[tokio::test]
    async fn sequence_conflict_on_gap() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let event1 = create_test_event(&aggregate_id, SequenceNumber::first());
        store
            .append(vec![event1], AppendOptions::expect_new())
            .await
            .unwrap();

        let gapped = vec![create_test_event(&aggregate_id, SequenceNumber::new(5))];
        let result = store.append(gapped, AppendOptions::new()).await;

        assert!(matches!(
            result,
            Err(EventStoreError::SequenceConflict { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_batch_rejected() {
        let store = InMemoryEventStore::new();
        let result = store.append(vec![], AppendOptions::new()).await;
        assert!(matches!(result, Err(EventStoreError::InvalidBatch(_))));
    }

    #[tokio::test]
    async fn streams_are_isolated() {
        let store = InMemoryEventStore::new();
        let cart_a = CartId::new("cart-a");
        let cart_b = CartId::new("cart-b");

        store
            .append(
                vec![create_test_event(&cart_a, SequenceNumber::first())],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(&cart_b, SequenceNumber::first())],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        assert_eq!(store.get_events(&cart_a).await.unwrap().len(), 1);
        assert_eq!(store.get_events(&cart_b).await.unwrap().len(), 1);
        assert_eq!(store.event_count().await, 2);
    }

    #[tokio::test]
    async fn stream_exists() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        assert!(!store.stream_exists(&aggregate_id).await.unwrap());

        store
            .append_event(
                create_test_event(&aggregate_id, SequenceNumber::first()),
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        assert!(store.stream_exists(&aggregate_id).await.unwrap());
    }

    #[tokio::test]
    async fn current_sequence_tracks_last_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = CartId::new("cart-1");

        let events = vec![
            create_test_event(&aggregate_id, SequenceNumber::new(1)),
            create_test_event(&aggregate_id, SequenceNumber::new(2)),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();

        assert_eq!(
            store.current_sequence(&aggregate_id).await.unwrap(),
            SequenceNumber::new(2)
        );
    }
}
