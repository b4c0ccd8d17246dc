//! Demo entry point.
//!
//! Drives the cart service through a full load-mutate-save cycle
//! against the in-memory event store and logs the resulting stream.

use common::CartId;
use domain::{CartService, DomainError, Item, ItemId, Money};
use event_store::{EventStore, InMemoryEventStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;
use config::Config;

#[tokio::main]
async fn main() -> Result<(), DomainError> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Single long-lived store handle, created here and passed down.
    let store = InMemoryEventStore::new();
    let service = CartService::new(store.clone());

    let cart_id = CartId::new(config.cart_id.clone());

    service
        .add_item_to_cart(&cart_id, Item::new("A", "Coffee", Money::from_cents(100)))
        .await?;
    service
        .add_item_to_cart(&cart_id, Item::new("B", "Tea", Money::from_cents(200)))
        .await?;

    if let Some(cart) = service.get_cart(&cart_id).await? {
        tracing::info!(
            %cart_id,
            total = %cart.total_price(),
            items = cart.item_count(),
            "cart reloaded from history"
        );
    }

    service
        .remove_item_from_cart(&cart_id, ItemId::new("A"))
        .await?;

    if let Some(cart) = service.get_cart(&cart_id).await? {
        tracing::info!(%cart_id, total = %cart.total_price(), "item removed");
    }

    let events = store.get_events(&cart_id).await?;
    for envelope in &events {
        tracing::info!(
            sequence = %envelope.sequence_number,
            event_type = %envelope.event_type,
            event_id = %envelope.event_id,
            timestamp = %envelope.timestamp,
            "stored event"
        );
    }

    Ok(())
}
