use crate::db::{BookingRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{Booking, NewUser, User, UserUpdate};
use crate::routes::admin::AdminSession;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    request.validate().map_err(AppError::InvalidRequest)?;
    let user = state.repo.create_user(&request.normalized()).await?;
    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users (admin)
pub async fn list_users(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.repo.list_users().await?))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    state
        .repo
        .get_user(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UserUpdate>,
) -> Result<Json<User>> {
    request.validate().map_err(AppError::InvalidRequest)?;
    Ok(Json(state.repo.update_user(&id, &request.normalized()).await?))
}

/// GET /users/{id}/bookings
pub async fn user_bookings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Booking>>> {
    if state.repo.get_user(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }
    Ok(Json(state.repo.list_user_bookings(&id).await?))
}
