//! Booking endpoints.
//!
//! - POST /book { customer: string, room: number }
//!   Records a booking and returns it with its assigned id (201).
//!   Any other method on /book except GET answers 405.
//!
//! - GET /book
//!   Lists recorded bookings in insertion order.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::models::{Booking, NewBooking};
use crate::store::SharedStore;

pub fn routes(store: SharedStore) -> Router {
    Router::new()
        .route("/book", post(create_booking).get(list_bookings))
        .with_state(store)
}

async fn create_booking(
    State(store): State<SharedStore>,
    payload: std::result::Result<Json<NewBooking>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>)> {
    let Json(booking) = payload.map_err(|e| AppError::InvalidBody(e.body_text()))?;
    let booking = store.add(booking).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(State(store): State<SharedStore>) -> Result<Json<Vec<Booking>>> {
    let bookings = store.list().await?;
    Ok(Json(bookings))
}
