use crate::cache::{geocode_cache_key, GeocodeCache, GeocodeEntry};
use crate::config::GeocodingConfig;
use crate::constants::{GEOCODER_USER_AGENT, GEOCODE_TIMEOUT_SECONDS, GOOGLE_GEOCODE_URL};
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Resolves place names to coordinates.
///
/// Google is tried first when an API key is configured, then Nominatim.
/// Every lookup, including a miss, is cached by normalised place name.
#[derive(Clone)]
pub struct GeocodingService {
    client: Client,
    nominatim_base_url: String,
    google_api_key: Option<String>,
    cache: Arc<dyn GeocodeCache>,
}

impl GeocodingService {
    pub fn new(config: &GeocodingConfig, cache: Arc<dyn GeocodeCache>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GEOCODE_TIMEOUT_SECONDS))
            .user_agent(GEOCODER_USER_AGENT)
            .build()
            .map_err(|e| AppError::Geocoding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(GeocodingService {
            client,
            nominatim_base_url: config.nominatim_base_url.trim_end_matches('/').to_string(),
            google_api_key: config.google_api_key.clone(),
            cache,
        })
    }

    /// Coordinates for `place`, or `None` when no provider knows it.
    /// Provider failures are logged and count as misses.
    pub async fn coordinates(&self, place: &str) -> Option<Coordinates> {
        let place = place.trim();
        if place.is_empty() {
            return None;
        }

        let key = geocode_cache_key(place);
        if let Some(entry) = self.cache.get(&key).await {
            return entry.coordinates;
        }

        let mut found = None;
        if let Some(api_key) = &self.google_api_key {
            found = self.google(place, api_key).await.unwrap_or_else(|e| {
                tracing::warn!("Google geocoding failed for '{}': {}", place, e);
                None
            });
        }
        if found.is_none() {
            found = self.nominatim(place).await.unwrap_or_else(|e| {
                tracing::warn!("Nominatim geocoding failed for '{}': {}", place, e);
                None
            });
        }

        match found {
            Some(coords) => {
                tracing::debug!("Geocoded '{}' to ({}, {})", place, coords.lat, coords.lng);
                self.cache.put(&key, GeocodeEntry::hit(coords)).await;
            }
            None => {
                tracing::info!("No coordinates found for '{}'", place);
                self.cache.put(&key, GeocodeEntry::miss()).await;
            }
        }
        found
    }

    /// Two-point polyline `[origin, destination]`, empty unless both resolve.
    pub async fn route_polyline(&self, origin: &str, destination: &str) -> Vec<Coordinates> {
        let (from, to) = tokio::join!(self.coordinates(origin), self.coordinates(destination));
        match (from, to) {
            (Some(from), Some(to)) => vec![from, to],
            _ => Vec::new(),
        }
    }

    async fn google(&self, place: &str, api_key: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(GOOGLE_GEOCODE_URL)
            .query(&[("address", place), ("key", api_key)])
            .send()
            .await
            .map_err(|e| AppError::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Geocoding(format!("HTTP {}", response.status())));
        }

        let body: GoogleResponse = response
            .json()
            .await
            .map_err(|e| AppError::Geocoding(format!("Failed to parse response: {}", e)))?;

        Ok(body.first_location())
    }

    async fn nominatim(&self, place: &str) -> Result<Option<Coordinates>> {
        let url = format!("{}/search", self.nominatim_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Geocoding(format!("HTTP {}", response.status())));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| AppError::Geocoding(format!("Failed to parse response: {}", e)))?;

        Ok(places.first().and_then(NominatimPlace::coordinates))
    }
}

// Provider response types

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

impl GoogleResponse {
    fn first_location(&self) -> Option<Coordinates> {
        if self.status != "OK" {
            return None;
        }
        let location = &self.results.first()?.geometry.location;
        Coordinates::new(location.lat, location.lng).ok()
    }
}

/// Nominatim returns coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.lat.trim().parse().ok()?;
        let lng = self.lon.trim().parse().ok()?;
        Coordinates::new(lat, lng).ok()
    }
}
