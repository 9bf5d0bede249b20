use crate::db::RouteRepository;
use crate::error::{AppError, Result};
use crate::models::{FindRouteRequest, Journey, NewRoute, Route, RouteSearchParams};
use crate::routes::admin::AdminSession;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// GET /routes
pub async fn list_routes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Route>>> {
    Ok(Json(state.repo.list_routes().await?))
}

/// GET /routes/search?origin=&destination=
pub async fn search_routes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RouteSearchParams>,
) -> Result<Json<Vec<Route>>> {
    let routes = state.repo.search_routes(&params).await?;
    tracing::debug!(
        "Route search origin={:?} destination={:?}: {} result(s)",
        params.origin,
        params.destination,
        routes.len()
    );
    Ok(Json(routes))
}

/// POST /routes (admin)
///
/// A route without coordinates gets a two-point polyline from geocoding its
/// endpoints when possible; geocoding never fails the request.
pub async fn add_route(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewRoute>,
) -> Result<(StatusCode, Json<Route>)> {
    request.validate().map_err(AppError::InvalidRequest)?;
    let mut request = request.normalized();

    if request.coords.is_empty() {
        if let Some(geocoder) = &state.geocoder {
            request.coords = geocoder
                .route_polyline(&request.origin, &request.destination)
                .await;
        }
    }

    let route = state.repo.insert_route(&request).await?;
    tracing::info!(
        "Added route {}: {} -> {} ({} km)",
        route.id,
        route.origin,
        route.destination,
        route.distance_km
    );
    Ok((StatusCode::CREATED, Json(route)))
}

/// DELETE /routes/{id} (admin)
pub async fn delete_route(
    _admin: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.repo.delete_route(id).await?;
    tracing::info!("Deleted route {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /routes/find
/// Shortest multi-leg journey between two stops, priced
pub async fn find_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FindRouteRequest>,
) -> Result<Json<Journey>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    let routes = state.repo.list_routes().await?;
    let journey = state.planner.plan(&routes, &request.from, &request.to)?;

    tracing::info!(
        "Journey {} -> {}: {} leg(s), {:.2} km, fare {:.2} ({:?})",
        request.from.trim(),
        request.to.trim(),
        journey.legs.len(),
        journey.distance_km,
        journey.fare,
        journey.fare_source
    );
    Ok(Json(journey))
}
