// Library exports for the server binary, the import tool and tests

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod routes_file;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use cache::GeocodeCache;
use db::Repository;
use services::{AdminAuth, GeocodingService, JourneyPlanner};
use std::sync::Arc;

/// Everything the handlers share, built once in `main`.
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub planner: JourneyPlanner,
    /// `None` when geocoding is disabled
    pub geocoder: Option<GeocodingService>,
    pub auth: AdminAuth,
    pub cache: Option<Arc<dyn GeocodeCache>>,
}
