use crate::db::BookingRepository;
use crate::error::{AppError, Result};
use crate::models::{Booking, CancelBooking, NewBooking};
use crate::routes::admin::AdminSession;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>)> {
    request.validate().map_err(AppError::InvalidRequest)?;
    let booking = state.repo.create_booking(&request.normalized()).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings (admin)
pub async fn list_bookings(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Booking>>> {
    Ok(Json(state.repo.list_bookings().await?))
}

/// GET /bookings/{id}
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    state
        .repo
        .get_booking(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
}

/// POST /bookings/{id}/cancel
///
/// The body is optional; anonymous bookings can be cancelled without one.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<Booking>> {
    let request = parse_cancel_body(&body)?;
    Ok(Json(state.repo.cancel_booking(id, &request).await?))
}

fn parse_cancel_body(body: &[u8]) -> Result<CancelBooking> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CancelBooking::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid cancellation body: {}", e)))
}
