pub mod auth;
pub mod fares;
pub mod geocoding;
pub mod journey;
pub mod pathfinder;

pub use auth::{AdminAuth, AdminClaims, AdminToken};
pub use geocoding::GeocodingService;
pub use journey::JourneyPlanner;
pub use pathfinder::{RouteGraph, ShortestPath};
