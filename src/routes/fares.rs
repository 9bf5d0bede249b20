use crate::error::{AppError, Result};
use crate::models::{FareQuote, FareQuoteRequest};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// POST /fares/quote
pub async fn quote_fare(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FareQuoteRequest>,
) -> Result<Json<FareQuote>> {
    request.validate().map_err(AppError::InvalidRequest)?;
    Ok(Json(state.planner.fares().quote(request.distance_km)))
}
