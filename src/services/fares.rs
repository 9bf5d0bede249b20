use crate::config::FarePolicy;
use crate::models::FareQuote;

/// Round to two decimal places, the precision fares and times are quoted in.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl FarePolicy {
    /// `base_fare + distance_km * per_km_rate`, rounded to cents.
    pub fn fare_for(&self, distance_km: f64) -> f64 {
        round2(self.base_fare + distance_km * self.per_km_rate)
    }

    /// Estimated hours on the road at the average coach speed.
    pub fn travel_time_hours(&self, distance_km: f64) -> f64 {
        round2(distance_km / self.average_speed_kmh)
    }

    pub fn quote(&self, distance_km: f64) -> FareQuote {
        FareQuote {
            distance_km: round2(distance_km),
            fare: self.fare_for(distance_km),
            time_hours: self.travel_time_hours(distance_km),
        }
    }
}
