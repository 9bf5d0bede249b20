use crate::constants::MAX_PLACE_NAME_LEN;
use crate::models::{check_name, Coordinates};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Key used wherever stop names are compared: trimmed and lowercased.
pub fn place_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A single origin/destination leg served by buses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    /// Explicit ticket price; when absent the fare is computed from distance
    pub ticket_price: Option<f64>,
    pub duration_min: Option<i32>,
    /// Polyline from origin to destination, may be empty
    pub coords: Vec<Coordinates>,
    pub stops: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Which way a route was matched against a requested leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Route {
    /// Whether this route joins `from` and `to`, in either direction.
    /// Comparison ignores case and surrounding whitespace.
    pub fn connects(&self, from: &str, to: &str) -> Option<Direction> {
        let (origin, destination) = (place_key(&self.origin), place_key(&self.destination));
        let (from, to) = (place_key(from), place_key(to));

        if origin == from && destination == to {
            Some(Direction::Forward)
        } else if origin == to && destination == from {
            Some(Direction::Reverse)
        } else {
            None
        }
    }
}

/// Body of `POST /routes`.
///
/// Every field defaults so that missing values surface as validation errors
/// rather than deserialization failures. `from`/`to`/`distance` are accepted
/// as aliases for older clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRoute {
    #[serde(default, alias = "from")]
    pub origin: String,
    #[serde(default, alias = "to")]
    pub destination: String,
    #[serde(default, alias = "distance")]
    pub distance_km: f64,
    #[serde(default)]
    pub ticket_price: Option<f64>,
    #[serde(default)]
    pub duration_min: Option<i32>,
    #[serde(default)]
    pub coords: Vec<Coordinates>,
    #[serde(default)]
    pub stops: Vec<String>,
}

impl NewRoute {
    pub fn validate(&self) -> Result<(), String> {
        check_name("origin", &self.origin, MAX_PLACE_NAME_LEN)?;
        check_name("destination", &self.destination, MAX_PLACE_NAME_LEN)?;

        if place_key(&self.origin) == place_key(&self.destination) {
            return Err("origin and destination must differ".to_string());
        }

        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err("distance_km must be a positive number".to_string());
        }

        if let Some(price) = self.ticket_price {
            if !price.is_finite() || price <= 0.0 {
                return Err("ticket_price must be a positive number".to_string());
            }
        }

        if let Some(duration) = self.duration_min {
            if duration < 0 {
                return Err("duration_min must not be negative".to_string());
            }
        }

        for coords in &self.coords {
            coords.validate()?;
        }

        for stop in &self.stops {
            check_name("stop", stop, MAX_PLACE_NAME_LEN)?;
        }

        Ok(())
    }

    /// Trim all free-text fields.
    pub fn normalized(mut self) -> Self {
        self.origin = self.origin.trim().to_string();
        self.destination = self.destination.trim().to_string();
        self.stops = self.stops.iter().map(|s| s.trim().to_string()).collect();
        self
    }
}

/// Query parameters for `GET /routes/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteSearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl RouteSearchParams {
    /// Substring filters, lowercased; blank values mean "any".
    pub fn patterns(&self) -> (Option<String>, Option<String>) {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(place_key)
                .filter(|s| !s.is_empty())
        };
        (clean(&self.origin), clean(&self.destination))
    }

    pub fn matches(&self, route: &Route) -> bool {
        let (origin, destination) = self.patterns();
        origin.map_or(true, |o| place_key(&route.origin).contains(&o))
            && destination.map_or(true, |d| place_key(&route.destination).contains(&d))
    }
}
