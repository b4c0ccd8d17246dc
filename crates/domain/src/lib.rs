//! Domain layer for the cart event-sourcing system.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for event-sourced entities with an uncommitted
//!   event buffer
//! - DomainEvent trait for domain events
//! - Repository for loading aggregates by replay and saving them by
//!   appending events
//! - Cart aggregate implementation and its application service

pub mod aggregate;
pub mod cart;
pub mod error;
pub mod repository;

pub use aggregate::{Aggregate, DomainEvent};
pub use cart::{Cart, CartError, CartEvent, CartService, Item, ItemId, Money};
pub use error::DomainError;
pub use repository::Repository;
