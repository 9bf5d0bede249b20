use crate::constants::MAX_NAME_LEN;
use crate::models::check_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(format!("Invalid booking status: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub bus_id: i64,
    pub user_id: Option<String>,
    pub passenger_name: String,
    pub seats_booked: i32,
    /// Seat numbers held by this booking, ascending
    pub seat_numbers: Vec<i32>,
    /// `seats_booked * fare` at the time of booking
    pub total_price: f64,
    pub status: BookingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
}

/// Body of `POST /bookings`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBooking {
    #[serde(default)]
    pub bus_id: i64,
    #[serde(default)]
    pub passenger_name: String,
    /// May be omitted when `seat_numbers` is given
    #[serde(default, alias = "seats_booked")]
    pub seats: i32,
    /// Specific seats to take. When empty the lowest free seats are assigned.
    #[serde(default, alias = "seatIDs", alias = "seat_ids")]
    pub seat_numbers: Vec<i32>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl NewBooking {
    pub fn validate(&self) -> Result<(), String> {
        if self.bus_id <= 0 {
            return Err("bus_id is required".to_string());
        }
        check_name("passenger_name", &self.passenger_name, MAX_NAME_LEN)?;
        if !self.seat_numbers.is_empty() {
            if self.seat_numbers.iter().any(|&n| n < 1) {
                return Err("seat_numbers must be positive".to_string());
            }
            let mut sorted = self.seat_numbers.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != self.seat_numbers.len() {
                return Err("seat_numbers must not repeat".to_string());
            }
            if self.seats != 0 && self.seats as usize != self.seat_numbers.len() {
                return Err("seats must match the number of seat_numbers".to_string());
            }
        } else if self.seats < 1 {
            return Err("seats must be at least 1".to_string());
        }
        if let Some(user_id) = &self.user_id {
            if user_id.trim().is_empty() {
                return Err("user_id must not be blank".to_string());
            }
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.passenger_name = self.passenger_name.trim().to_string();
        self.user_id = self.user_id.map(|u| u.trim().to_string());
        if !self.seat_numbers.is_empty() {
            self.seat_numbers.sort_unstable();
            self.seats = self.seat_numbers.len() as i32;
        }
        self
    }
}

/// Body of `POST /bookings/{id}/cancel`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelBooking {
    /// Must match the booking's owner when it has one
    #[serde(default)]
    pub user_id: Option<String>,
}

impl CancelBooking {
    /// Whether this request may cancel a booking owned by `owner`.
    pub fn authorizes(&self, owner: Option<&str>) -> bool {
        match owner {
            None => true,
            Some(owner) => self.user_id.as_deref().map(str::trim) == Some(owner),
        }
    }
}
