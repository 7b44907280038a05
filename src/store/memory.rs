use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Booking, NewBooking};
use crate::store::{BookingStore, StoreError};

/// Bookings kept in process memory; lost on restart.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn add(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let mut bookings = self.bookings.lock().map_err(|_| StoreError::LockPoisoned)?;

        let booking = Booking {
            id: bookings.len() as u64 + 1,
            customer: booking.customer,
            room: booking.room,
            created_at: Utc::now(),
        };
        bookings.push(booking.clone());

        tracing::info!(id = booking.id, room = booking.room, "Booking recorded");
        Ok(booking)
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(bookings.clone())
    }
}
