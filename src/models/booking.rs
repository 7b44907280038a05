use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: u64,
    pub customer: String,
    pub room: u32,
    pub created_at: DateTime<Utc>,
}

/// Request body for a new booking. Any client supplied `id` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub customer: String,
    pub room: u32,
}
