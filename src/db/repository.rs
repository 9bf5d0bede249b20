use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingStatus, Bus, BusUpdate, CancelBooking, Coordinates, NewBooking, NewBus,
    NewRoute, NewUser, Route, RouteSearchParams, User, UserUpdate,
};
use async_trait::async_trait;
use sqlx::types::Json;
use std::collections::BTreeSet;
use time::OffsetDateTime;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Shared row types (decoded by both PostgreSQL and SQLite)
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
pub(super) struct RouteRow {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub ticket_price: Option<f64>,
    pub duration_min: Option<i32>,
    pub coords: Json<Vec<Coordinates>>,
    pub stops: Json<Vec<String>>,
    pub created_at: OffsetDateTime,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            distance_km: row.distance_km,
            ticket_price: row.ticket_price,
            duration_min: row.duration_min,
            coords: row.coords.0,
            stops: row.stops.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct BusRow {
    pub id: i64,
    pub route_id: i64,
    pub operator: String,
    pub total_seats: i32,
    pub seats_available: i32,
    pub fare: f64,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

impl From<BusRow> for Bus {
    fn from(row: BusRow) -> Self {
        Bus {
            id: row.id,
            route_id: row.route_id,
            operator: row.operator,
            total_seats: row.total_seats,
            seats_available: row.seats_available,
            fare: row.fare,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Raw booking fields extracted from a database row, before validation.
/// PostgreSQL stores the id as UUID and SQLite as TEXT; both populate this
/// struct and call `into_booking()`.
pub(super) struct RawBookingRow {
    pub id: Uuid,
    pub bus_id: i64,
    pub user_id: Option<String>,
    pub passenger_name: String,
    pub seats_booked: i32,
    pub seat_numbers: Vec<i32>,
    pub total_price: f64,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub cancelled_at: Option<OffsetDateTime>,
}

impl RawBookingRow {
    pub fn into_booking(self) -> Booking {
        let status = self.status.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid status '{}' for booking {}, treating as cancelled",
                self.status,
                self.id
            );
            BookingStatus::Cancelled
        });

        Booking {
            id: self.id,
            bus_id: self.bus_id,
            user_id: self.user_id,
            passenger_name: self.passenger_name,
            seats_booked: self.seats_booked,
            seat_numbers: self.seat_numbers,
            total_price: self.total_price,
            status,
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        }
    }
}

/// Price of a booking, rounded to cents.
pub(super) fn booking_total(seats: i32, fare: f64) -> f64 {
    (seats as f64 * fare * 100.0).round() / 100.0
}

/// Flatten the seat lists of a bus's confirmed bookings.
pub(super) fn taken_seats(rows: Vec<Json<Vec<i32>>>) -> BTreeSet<i32> {
    rows.into_iter().flat_map(|seats| seats.0).collect()
}

/// Pick the seat numbers for a booking. Requested seats must exist and be
/// free; otherwise the lowest free numbers are assigned.
pub(super) fn allocate_seats(
    total_seats: i32,
    taken: &BTreeSet<i32>,
    booking: &NewBooking,
) -> Result<Vec<i32>> {
    if !booking.seat_numbers.is_empty() {
        if let Some(bad) = booking.seat_numbers.iter().find(|&&n| n > total_seats) {
            return Err(AppError::InvalidRequest(format!(
                "Seat {} does not exist on a {}-seat bus",
                bad, total_seats
            )));
        }
        let clashes: Vec<String> = booking
            .seat_numbers
            .iter()
            .filter(|n| taken.contains(*n))
            .map(|n| n.to_string())
            .collect();
        if !clashes.is_empty() {
            return Err(AppError::Conflict(format!(
                "Seat(s) {} already booked",
                clashes.join(", ")
            )));
        }
        let mut seats = booking.seat_numbers.clone();
        seats.sort_unstable();
        return Ok(seats);
    }

    let wanted = booking.seats.max(0) as usize;
    let free: Vec<i32> = (1..=total_seats)
        .filter(|n| !taken.contains(n))
        .take(wanted)
        .collect();
    if free.len() < wanted {
        return Err(AppError::Conflict(format!(
            "Only {} seat number(s) free on bus {}",
            free.len(),
            booking.bus_id
        )));
    }
    Ok(free)
}

// ---------------------------------------------------------------------------
// Repository traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn list_routes(&self) -> Result<Vec<Route>>;

    async fn search_routes(&self, params: &RouteSearchParams) -> Result<Vec<Route>>;

    async fn get_route(&self, id: i64) -> Result<Option<Route>>;

    async fn insert_route(&self, route: &NewRoute) -> Result<Route>;

    /// Fails with `NotFound` for unknown ids and `Conflict` while buses
    /// still serve the route.
    async fn delete_route(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait BusRepository: Send + Sync {
    async fn list_buses(&self, route_id: Option<i64>) -> Result<Vec<Bus>>;

    async fn get_bus(&self, id: i64) -> Result<Option<Bus>>;

    /// New buses start with every seat available.
    async fn insert_bus(&self, bus: &NewBus) -> Result<Bus>;

    async fn update_bus(&self, id: i64, update: &BusUpdate) -> Result<Bus>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Reserve seats and record the booking in one transaction. The seat
    /// counter is decremented with a conditional update, so concurrent
    /// requests can never take more seats than the bus has.
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking>;

    /// Cancel a confirmed booking and return its seats to the bus.
    async fn cancel_booking(&self, id: Uuid, request: &CancelBooking) -> Result<Booking>;

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>>;

    async fn list_bookings(&self) -> Result<Vec<Booking>>;

    async fn list_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>>;

    /// Seat numbers held by confirmed bookings on a bus, ascending.
    async fn booked_seat_numbers(&self, bus_id: i64) -> Result<Vec<i32>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User>;

    async fn list_users(&self) -> Result<Vec<User>>;
}

/// Everything the HTTP layer needs from storage.
#[async_trait]
pub trait Repository:
    RouteRepository + BusRepository + BookingRepository + UserRepository
{
    /// Cheap round trip used by the health check
    async fn ping(&self) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

pub struct PgRepository {
    pool: sqlx::PgPool,
}

impl PgRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait]
impl RouteRepository for PgRepository {
    async fn list_routes(&self) -> Result<Vec<Route>> {
        Ok(super::route_queries::list_routes(&self.pool).await?)
    }

    async fn search_routes(&self, params: &RouteSearchParams) -> Result<Vec<Route>> {
        let (origin, destination) = params.patterns();
        Ok(super::route_queries::search_routes(
            &self.pool,
            origin.as_deref(),
            destination.as_deref(),
        )
        .await?)
    }

    async fn get_route(&self, id: i64) -> Result<Option<Route>> {
        Ok(super::route_queries::get_route(&self.pool, id).await?)
    }

    async fn insert_route(&self, route: &NewRoute) -> Result<Route> {
        Ok(super::route_queries::insert_route(&self.pool, route).await?)
    }

    async fn delete_route(&self, id: i64) -> Result<()> {
        super::route_queries::delete_route(&self.pool, id).await
    }
}

#[async_trait]
impl BusRepository for PgRepository {
    async fn list_buses(&self, route_id: Option<i64>) -> Result<Vec<Bus>> {
        Ok(super::route_queries::list_buses(&self.pool, route_id).await?)
    }

    async fn get_bus(&self, id: i64) -> Result<Option<Bus>> {
        Ok(super::route_queries::get_bus(&self.pool, id).await?)
    }

    async fn insert_bus(&self, bus: &NewBus) -> Result<Bus> {
        super::route_queries::insert_bus(&self.pool, bus).await
    }

    async fn update_bus(&self, id: i64, update: &BusUpdate) -> Result<Bus> {
        super::route_queries::update_bus(&self.pool, id, update).await
    }
}

#[async_trait]
impl BookingRepository for PgRepository {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        super::booking_queries::create_booking(&self.pool, booking).await
    }

    async fn cancel_booking(&self, id: Uuid, request: &CancelBooking) -> Result<Booking> {
        super::booking_queries::cancel_booking(&self.pool, id, request).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(super::booking_queries::get_booking(&self.pool, id).await?)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>> {
        Ok(super::booking_queries::list_bookings(&self.pool, None).await?)
    }

    async fn list_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>> {
        Ok(super::booking_queries::list_bookings(&self.pool, Some(user_id)).await?)
    }

    async fn booked_seat_numbers(&self, bus_id: i64) -> Result<Vec<i32>> {
        Ok(super::booking_queries::booked_seat_numbers(&self.pool, bus_id).await?)
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        super::booking_queries::create_user(&self.pool, user).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(super::booking_queries::get_user(&self.pool, id).await?)
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
        super::booking_queries::update_user(&self.pool, id, update).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(super::booking_queries::list_users(&self.pool).await?)
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
