pub mod booking;
pub mod bus;
pub mod coordinates;
pub mod journey;
pub mod route;
pub mod user;

pub use booking::{Booking, BookingStatus, CancelBooking, NewBooking};
pub use bus::{Bus, BusUpdate, NewBus, SeatAvailability, SeatMap};
pub use coordinates::Coordinates;
pub use journey::{FareQuote, FareQuoteRequest, FareSource, FindRouteRequest, Journey, JourneyLeg};
pub use route::{place_key, NewRoute, Route, RouteSearchParams};
pub use user::{NewUser, User, UserUpdate};

/// Shared check for required free-text fields.
pub(crate) fn check_name(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{} must be at most {} characters", field, max_len));
    }
    Ok(())
}
