//! Booking storage.
//!
//! Handlers only see the `BookingStore` trait, so the in-memory list can be
//! replaced by durable storage without touching the routes.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Booking, NewBooking};

pub use memory::InMemoryBookingStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Lock poisoned")]
    LockPoisoned,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Record a booking and return it with its assigned id.
    async fn add(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    /// All bookings in insertion order.
    async fn list(&self) -> Result<Vec<Booking>, StoreError>;
}

pub type SharedStore = Arc<dyn BookingStore>;
