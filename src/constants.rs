//! Stable application-wide constants.
//!
//! Values here are structural limits and default fallbacks for env-var-based
//! configuration. They should rarely change. Tunable pricing lives in
//! [`FarePolicy`](crate::config::FarePolicy) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Database pool ---

/// Upper bound on pooled database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;
/// Seconds to wait for a free pooled connection before failing the request.
pub const DB_ACQUIRE_TIMEOUT_SECONDS: u64 = 5;

// --- Fare defaults (used when BASE_FARE / PER_KM_RATE / AVERAGE_SPEED_KMH are absent) ---

/// Flat component of every computed fare.
pub const DEFAULT_BASE_FARE: f64 = 10.0;
/// Distance component of a computed fare, per kilometer.
pub const DEFAULT_PER_KM_RATE: f64 = 0.5;
/// Average coach speed used for travel-time estimates.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 60.0;

// --- Geocoding ---

/// Public Nominatim instance. Overridden by `NOMINATIM_BASE_URL`.
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
/// Google Geocoding endpoint, only used when `GOOGLE_MAPS_API_KEY` is set.
pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
/// Nominatim's usage policy requires an identifying User-Agent.
pub const GEOCODER_USER_AGENT: &str = "busroute/0.1";
/// Per-request timeout for geocoding providers.
pub const GEOCODE_TIMEOUT_SECONDS: u64 = 10;
/// Default geocode cache TTL: 7 days. Overridden by `GEOCODE_CACHE_TTL`.
pub const DEFAULT_GEOCODE_CACHE_TTL_SECONDS: u64 = 604_800;
/// Maximum entries for the in-memory geocode cache.
pub const DEFAULT_MEMORY_CACHE_MAX_ENTRIES: u64 = 10_000;

// --- Admin auth ---

/// Default lifetime of an admin token. Overridden by `ADMIN_TOKEN_TTL`.
pub const DEFAULT_ADMIN_TOKEN_TTL_SECONDS: u64 = 3_600;
/// HS256 secrets shorter than this are rejected at startup.
pub const MIN_JWT_SECRET_BYTES: usize = 32;
/// Subject claim carried by every admin token.
pub const ADMIN_SUBJECT: &str = "admin";

// --- Validation limits ---

/// Longest accepted stop/city name.
pub const MAX_PLACE_NAME_LEN: usize = 100;
/// Longest accepted passenger, operator or user name.
pub const MAX_NAME_LEN: usize = 100;
