//! Cart application service.

use common::CartId;
use event_store::EventStore;

use crate::error::DomainError;
use crate::repository::Repository;

use super::{Cart, CartError, Item, ItemId};

/// Number of attempts per use case before a concurrency conflict is
/// surfaced to the caller.
const MAX_COMMAND_ATTEMPTS: u32 = 3;

/// Application service orchestrating cart use cases.
///
/// Each operation is one load-mutate-save cycle through the repository.
/// Command failures are terminal for the use case: nothing is saved.
/// Concurrency conflicts are retried with a fresh load a bounded number
/// of times, then propagated.
pub struct CartService<S: EventStore> {
    repository: Repository<S, Cart>,
}

impl<S: EventStore> CartService<S> {
    /// Creates a new cart service backed by the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &Repository<S, Cart> {
        &self.repository
    }

    /// Adds an item to a cart, creating the cart if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn add_item_to_cart(
        &self,
        cart_id: &CartId,
        item: Item,
    ) -> Result<Cart, DomainError> {
        self.execute(cart_id, |cart| cart.add_item(item.clone()))
            .await
    }

    /// Removes an item from a cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item_from_cart(
        &self,
        cart_id: &CartId,
        item_id: ItemId,
    ) -> Result<Cart, DomainError> {
        self.execute(cart_id, |cart| cart.remove_item(item_id.clone()))
            .await
    }

    /// Loads a cart without mutating it.
    #[tracing::instrument(skip(self))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, DomainError> {
        self.repository.find_by_id(cart_id).await
    }

    /// Runs one load-mutate-save cycle, retrying on concurrency
    /// conflicts with a fresh load each attempt.
    async fn execute<F>(&self, cart_id: &CartId, command: F) -> Result<Cart, DomainError>
    where
        F: Fn(&mut Cart) -> Result<(), CartError>,
    {
        let mut attempt = 1;
        loop {
            let mut cart = self
                .repository
                .find_by_id(cart_id)
                .await?
                .unwrap_or_default();

            command(&mut cart)?;

            match self.repository.save(cart_id, &mut cart).await {
                Ok(_) => return Ok(cart),
                Err(err) if err.is_concurrency_conflict() && attempt < MAX_COMMAND_ATTEMPTS => {
                    tracing::warn!(%cart_id, attempt, "concurrency conflict, reloading");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
