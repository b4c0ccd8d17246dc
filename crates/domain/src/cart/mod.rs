//! Cart aggregate and related types.

mod aggregate;
mod events;
mod service;
mod value_objects;

pub use aggregate::Cart;
pub use events::{CartEvent, ItemAddedData, ItemRemovedData};
pub use service::CartService;
pub use value_objects::{Item, ItemId, Money};

use thiserror::Error;

/// Errors that can occur during cart commands.
///
/// Raised synchronously before any event is created; a failed command
/// leaves the cart's state and uncommitted buffer untouched.
#[derive(Debug, Error)]
pub enum CartError {
    /// The item is already present in the cart.
    #[error("Item already in cart: {item_id}")]
    DuplicateItem { item_id: ItemId },

    /// The item is not present in the cart.
    #[error("Item not found in cart: {item_id}")]
    ItemNotFound { item_id: ItemId },
}
