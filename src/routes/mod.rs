pub mod admin;
pub mod bookings;
pub mod bus_routes;
pub mod buses;
pub mod debug;
pub mod fares;
pub mod users;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

/// API routes, to be nested under `/api/v1`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/debug/health", get(debug::health_check))
        .route("/admin/login", post(admin::login))
        .route(
            "/routes",
            get(bus_routes::list_routes).post(bus_routes::add_route),
        )
        .route("/routes/search", get(bus_routes::search_routes))
        .route("/routes/find", post(bus_routes::find_route))
        .route("/routes/{id}", delete(bus_routes::delete_route))
        .route("/fares/quote", post(fares::quote_fare))
        .route("/buses", get(buses::list_buses).post(buses::add_bus))
        .route("/buses/{id}", patch(buses::update_bus))
        .route("/buses/{id}/availability", get(buses::availability))
        .route("/buses/{id}/seats", get(buses::seats))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/{id}", get(bookings::get_booking))
        .route("/bookings/{id}/cancel", post(bookings::cancel_booking))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user),
        )
        .route("/users/{id}/bookings", get(users::user_bookings))
        .with_state(state)
}
