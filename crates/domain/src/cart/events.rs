//! Cart domain events.

use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Item, ItemId};

/// Events that can occur on a cart aggregate.
///
/// A closed sum: each kind carries only its relevant payload and is
/// discriminated explicitly, so replay never needs dynamic shape
/// checking. The serde tags are the same discriminators persisted in
/// the envelope's `event_type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    /// An item was added to the cart.
    #[serde(rename = "ItemAddedToCart")]
    ItemAdded(ItemAddedData),

    /// An item was removed from the cart.
    #[serde(rename = "ItemRemovedFromCart")]
    ItemRemoved(ItemRemovedData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ItemAdded(_) => "ItemAddedToCart",
            CartEvent::ItemRemoved(_) => "ItemRemovedFromCart",
        }
    }
}

/// Data for ItemAddedToCart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAddedData {
    /// The item that was added.
    pub item: Item,
}

/// Data for ItemRemovedFromCart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRemovedData {
    /// The item that was removed.
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
}

// Convenience constructors for events
impl CartEvent {
    /// Creates an ItemAddedToCart event.
    pub fn item_added(item: Item) -> Self {
        CartEvent::ItemAdded(ItemAddedData { item })
    }

    /// Creates an ItemRemovedFromCart event.
    pub fn item_removed(item_id: ItemId) -> Self {
        CartEvent::ItemRemoved(ItemRemovedData { item_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Money;

    #[test]
    fn event_type_matches_wire_discriminator() {
        let event = CartEvent::item_added(Item::new("A", "Coffee", Money::from_cents(100)));
        assert_eq!(event.event_type(), "ItemAddedToCart");

        let event = CartEvent::item_removed(ItemId::new("A"));
        assert_eq!(event.event_type(), "ItemRemovedFromCart");
    }

    #[test]
    fn item_added_serialization() {
        let event = CartEvent::item_added(Item::new("A", "Coffee", Money::from_cents(100)));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ItemAddedToCart");
        assert_eq!(json["data"]["item"]["id"], "A");
        assert_eq!(json["data"]["item"]["price"], 100);

        let deserialized: CartEvent = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn item_removed_serialization() {
        let event = CartEvent::item_removed(ItemId::new("B"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ItemRemovedFromCart");
        assert_eq!(json["data"]["itemId"], "B");

        let deserialized: CartEvent = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, event);
    }
}
