//! Cart aggregate implementation.

use std::collections::HashMap;

use event_store::SequenceNumber;

use crate::aggregate::Aggregate;

use super::{
    CartError, CartEvent, Item, ItemId, Money,
    events::{ItemAddedData, ItemRemovedData},
};

/// Cart aggregate root.
///
/// The cart's observable state (item prices and the running total) is
/// entirely derived from its event history. Commands validate against
/// the fully replayed state, then emit, apply, and buffer an event.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    /// Price of each item currently in the cart, keyed by item ID.
    item_prices: HashMap<ItemId, Money>,

    /// Running total; always equals the sum of `item_prices` values.
    total_price: Money,

    /// Last persisted sequence number, for optimistic concurrency.
    sequence: SequenceNumber,

    /// Events recorded since the last successful save.
    uncommitted: Vec<CartEvent>,
}

impl Aggregate for Cart {
    type Event = CartEvent;
    type Error = CartError;

    fn aggregate_type() -> &'static str {
        "Cart"
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            CartEvent::ItemAdded(data) => self.apply_item_added(data),
            CartEvent::ItemRemoved(data) => self.apply_item_removed(data),
        }
    }

    fn record(&mut self, event: Self::Event) {
        self.apply(event.clone());
        self.uncommitted.push(event);
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted
    }

    fn mark_events_as_committed(&mut self) {
        self.uncommitted.clear();
    }

    fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    fn set_sequence(&mut self, sequence: SequenceNumber) {
        self.sequence = sequence;
    }
}

// Query methods
impl Cart {
    /// Returns the current total price of the cart.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns true if the given item is currently in the cart.
    pub fn contains_item(&self, item_id: &ItemId) -> bool {
        self.item_prices.contains_key(item_id)
    }

    /// Returns the current price of an item, if present.
    pub fn price_of(&self, item_id: &ItemId) -> Option<Money> {
        self.item_prices.get(item_id).copied()
    }

    /// Returns the number of items in the cart.
    pub fn item_count(&self) -> usize {
        self.item_prices.len()
    }

    /// Returns the IDs of the items currently in the cart.
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.item_prices.keys()
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.item_prices.is_empty()
    }
}

// Command methods
impl Cart {
    /// Adds an item to the cart.
    ///
    /// Fails if an item with the same ID is already present in the
    /// current state, including items replayed from history.
    pub fn add_item(&mut self, item: Item) -> Result<(), CartError> {
        if self.item_prices.contains_key(&item.id) {
            return Err(CartError::DuplicateItem {
                item_id: item.id.clone(),
            });
        }

        self.record(CartEvent::item_added(item));
        Ok(())
    }

    /// Removes an item from the cart.
    ///
    /// Fails if no item with the given ID is present.
    pub fn remove_item(&mut self, item_id: ItemId) -> Result<(), CartError> {
        if !self.item_prices.contains_key(&item_id) {
            return Err(CartError::ItemNotFound { item_id });
        }

        self.record(CartEvent::item_removed(item_id));
        Ok(())
    }
}

// Apply event helpers
impl Cart {
    fn apply_item_added(&mut self, data: ItemAddedData) {
        self.total_price += data.item.price;
        self.item_prices.insert(data.item.id, data.item.price);
    }

    fn apply_item_removed(&mut self, data: ItemRemovedData) {
        if let Some(price) = self.item_prices.remove(&data.item_id) {
            self.total_price -= price;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;

    fn item(id: &str, cents: i64) -> Item {
        Item::new(id, format!("Item {id}"), Money::from_cents(cents))
    }

    fn total_invariant_holds(cart: &Cart) -> bool {
        let sum: Money = cart
            .item_ids()
            .filter_map(|id| cart.price_of(id))
            .sum();
        sum == cart.total_price()
    }

    #[test]
    fn new_cart_is_empty() {
        let cart = Cart::default();
        assert!(cart.is_empty());
        assert_eq!(cart.total_price(), Money::zero());
        assert!(cart.uncommitted_events().is_empty());
        assert_eq!(cart.sequence(), SequenceNumber::initial());
    }

    #[test]
    fn add_item_updates_total_and_buffers_event() {
        let mut cart = Cart::default();
        cart.add_item(item("A", 100)).unwrap();

        assert_eq!(cart.total_price().cents(), 100);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.uncommitted_events().len(), 1);
        assert_eq!(
            cart.uncommitted_events()[0].event_type(),
            "ItemAddedToCart"
        );
        assert!(total_invariant_holds(&cart));
    }

    #[test]
    fn add_duplicate_item_fails_and_records_nothing() {
        let mut cart = Cart::default();
        cart.add_item(item("A", 100)).unwrap();

        let result = cart.add_item(item("A", 999));
        assert!(matches!(result, Err(CartError::DuplicateItem { .. })));

        assert_eq!(cart.total_price().cents(), 100);
        assert_eq!(cart.uncommitted_events().len(), 1);
    }

    #[test]
    fn remove_item_updates_total() {
        let mut cart = Cart::default();
        cart.add_item(item("A", 100)).unwrap();
        cart.add_item(item("B", 200)).unwrap();

        cart.remove_item(ItemId::new("A")).unwrap();

        assert_eq!(cart.total_price().cents(), 200);
        assert!(!cart.contains_item(&ItemId::new("A")));
        assert_eq!(cart.uncommitted_events().len(), 3);
        assert!(total_invariant_holds(&cart));
    }

    #[test]
    fn remove_missing_item_fails_and_records_nothing() {
        let mut cart = Cart::default();
        let result = cart.remove_item(ItemId::new("ghost"));

        assert!(matches!(result, Err(CartError::ItemNotFound { .. })));
        assert!(cart.uncommitted_events().is_empty());
        assert_eq!(cart.total_price(), Money::zero());
    }

    #[test]
    fn from_history_rebuilds_state_without_buffering() {
        let events = vec![
            CartEvent::item_added(item("A", 100)),
            CartEvent::item_added(item("B", 200)),
            CartEvent::item_removed(ItemId::new("A")),
        ];

        let cart = Cart::from_history(events);

        assert_eq!(cart.total_price().cents(), 200);
        assert_eq!(cart.item_count(), 1);
        assert!(cart.contains_item(&ItemId::new("B")));
        assert!(cart.uncommitted_events().is_empty());
        assert!(total_invariant_holds(&cart));
    }

    #[test]
    fn replay_is_idempotent() {
        let events = vec![
            CartEvent::item_added(item("A", 100)),
            CartEvent::item_added(item("B", 200)),
            CartEvent::item_removed(ItemId::new("B")),
        ];

        let first = Cart::from_history(events.clone());
        let second = Cart::from_history(events);

        assert_eq!(first.total_price(), second.total_price());
        assert_eq!(first.item_count(), second.item_count());
    }

    #[test]
    fn duplicate_detection_considers_replayed_state() {
        let cart = Cart::from_history(vec![CartEvent::item_added(item("A", 100))]);
        let mut cart = cart;

        let result = cart.add_item(item("A", 999));
        assert!(matches!(result, Err(CartError::DuplicateItem { .. })));
        assert_eq!(cart.total_price().cents(), 100);
        assert!(cart.uncommitted_events().is_empty());
    }

    #[test]
    fn removing_then_readding_item_is_allowed() {
        let mut cart = Cart::default();
        cart.add_item(item("A", 100)).unwrap();
        cart.remove_item(ItemId::new("A")).unwrap();
        cart.add_item(item("A", 150)).unwrap();

        assert_eq!(cart.total_price().cents(), 150);
        assert_eq!(cart.uncommitted_events().len(), 3);
        assert!(total_invariant_holds(&cart));
    }

    #[test]
    fn mark_events_as_committed_clears_buffer_only() {
        let mut cart = Cart::default();
        cart.add_item(item("A", 100)).unwrap();
        cart.add_item(item("B", 200)).unwrap();

        cart.mark_events_as_committed();

        assert!(cart.uncommitted_events().is_empty());
        assert_eq!(cart.total_price().cents(), 300);
        assert_eq!(cart.item_count(), 2);
    }
}
