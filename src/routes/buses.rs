use crate::db::{BookingRepository, BusRepository};
use crate::error::{AppError, Result};
use crate::models::{Bus, BusUpdate, NewBus, SeatAvailability, SeatMap};
use crate::routes::admin::AdminSession;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct BusListParams {
    pub route_id: Option<i64>,
}

/// GET /buses?route_id=
pub async fn list_buses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BusListParams>,
) -> Result<Json<Vec<Bus>>> {
    Ok(Json(state.repo.list_buses(params.route_id).await?))
}

/// POST /buses (admin)
pub async fn add_bus(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewBus>,
) -> Result<(StatusCode, Json<Bus>)> {
    request.validate().map_err(AppError::InvalidRequest)?;

    let bus = state.repo.insert_bus(&request).await?;
    tracing::info!(
        "Added bus {} on route {} with {} seats",
        bus.id,
        bus.route_id,
        bus.total_seats
    );
    Ok((StatusCode::CREATED, Json(bus)))
}

/// PATCH /buses/{id} (admin)
pub async fn update_bus(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<BusUpdate>,
) -> Result<Json<Bus>> {
    request.validate().map_err(AppError::InvalidRequest)?;
    Ok(Json(state.repo.update_bus(id, &request).await?))
}

/// GET /buses/{id}/availability
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SeatAvailability>> {
    let bus = state
        .repo
        .get_bus(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))?;
    Ok(Json(bus.availability()))
}

/// GET /buses/{id}/seats
pub async fn seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SeatMap>> {
    let bus = state
        .repo
        .get_bus(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))?;
    let booked = state.repo.booked_seat_numbers(id).await?;
    Ok(Json(bus.seat_map(booked)))
}
