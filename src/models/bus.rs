use crate::constants::MAX_NAME_LEN;
use crate::models::check_name;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bus {
    pub id: i64,
    pub route_id: i64,
    pub operator: String,
    pub total_seats: i32,
    /// Seats not held by a confirmed booking
    pub seats_available: i32,
    /// Price of one seat
    pub fare: f64,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Bus {
    pub fn availability(&self) -> SeatAvailability {
        SeatAvailability {
            bus_id: self.id,
            total_seats: self.total_seats,
            seats_booked: self.total_seats - self.seats_available,
            seats_available: self.seats_available,
            is_active: self.is_active,
        }
    }

    /// Split the bus's seat numbers into booked and free.
    pub fn seat_map(&self, booked: Vec<i32>) -> SeatMap {
        let available = (1..=self.total_seats)
            .filter(|n| booked.binary_search(n).is_err())
            .collect();
        SeatMap {
            bus_id: self.id,
            total_seats: self.total_seats,
            booked,
            available,
        }
    }
}

/// Body of `POST /buses`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBus {
    #[serde(default)]
    pub route_id: i64,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub total_seats: i32,
    #[serde(default)]
    pub fare: Option<f64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewBus {
    pub fn validate(&self) -> Result<(), String> {
        if self.route_id <= 0 {
            return Err("route_id is required".to_string());
        }
        check_name("operator", &self.operator, MAX_NAME_LEN)?;
        if self.total_seats < 1 {
            return Err("total_seats must be at least 1".to_string());
        }
        match self.fare {
            None => Err("fare is required".to_string()),
            Some(fare) if !fare.is_finite() || fare < 0.0 => {
                Err("fare must be a non-negative number".to_string())
            }
            Some(_) => Ok(()),
        }
    }
}

/// Body of `PATCH /buses/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusUpdate {
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Applies to future bookings only
    #[serde(default)]
    pub fare: Option<f64>,
}

impl BusUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if self.is_active.is_none() && self.fare.is_none() {
            return Err("Nothing to update: provide is_active and/or fare".to_string());
        }
        if let Some(fare) = self.fare {
            if !fare.is_finite() || fare < 0.0 {
                return Err("fare must be a non-negative number".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatAvailability {
    pub bus_id: i64,
    pub total_seats: i32,
    pub seats_booked: i32,
    pub seats_available: i32,
    pub is_active: bool,
}

/// Seat numbers run from 1 to `total_seats`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatMap {
    pub bus_id: i64,
    pub total_seats: i32,
    pub booked: Vec<i32>,
    pub available: Vec<i32>,
}
