use crate::models::{check_name, place_key, Coordinates};
use crate::constants::MAX_PLACE_NAME_LEN;
use serde::{Deserialize, Serialize};

/// Body of `POST /routes/find`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindRouteRequest {
    #[serde(default, alias = "origin")]
    pub from: String,
    #[serde(default, alias = "destination")]
    pub to: String,
}

impl FindRouteRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_name("from", &self.from, MAX_PLACE_NAME_LEN)?;
        check_name("to", &self.to, MAX_PLACE_NAME_LEN)?;
        if place_key(&self.from) == place_key(&self.to) {
            return Err("from and to must differ".to_string());
        }
        Ok(())
    }
}

/// Where a journey's fare came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FareSource {
    /// Sum of explicit ticket prices, one per leg
    TicketPrices,
    /// Distance-based fare from the fare policy
    Computed,
}

/// One consecutive pair of stops within a journey.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JourneyLeg {
    pub from: String,
    pub to: String,
    /// Stored route that served this leg, if any matched
    pub route_id: Option<i64>,
    pub distance_km: Option<f64>,
    pub ticket_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Journey {
    pub path: Vec<String>,
    pub distance_km: f64,
    pub time_hours: f64,
    pub fare: f64,
    pub fare_source: FareSource,
    pub coords: Vec<Coordinates>,
    pub legs: Vec<JourneyLeg>,
}

/// Body of `POST /fares/quote`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FareQuoteRequest {
    #[serde(default, alias = "distance")]
    pub distance_km: f64,
}

impl FareQuoteRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            return Err("distance_km must be a positive number".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareQuote {
    pub distance_km: f64,
    pub fare: f64,
    pub time_hours: f64,
}
