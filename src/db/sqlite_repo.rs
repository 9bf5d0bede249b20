use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::types::Json;
use sqlx::{Sqlite, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingStatus, Bus, BusUpdate, CancelBooking, NewBooking, NewBus, NewRoute, NewUser,
    Route, RouteSearchParams, User, UserUpdate,
};

use super::repository::{
    allocate_seats, booking_total, taken_seats, BookingRepository, BusRepository, BusRow,
    RawBookingRow, Repository, RouteRepository, RouteRow, UserRepository, UserRow,
};

const ROUTE_COLUMNS: &str = "id, origin, destination, distance_km, ticket_price, duration_min, \
                             coords, stops, created_at";
const BUS_COLUMNS: &str =
    "id, route_id, operator, total_seats, seats_available, fare, is_active, created_at";
const BOOKING_COLUMNS: &str = "id, bus_id, user_id, passenger_name, seats_booked, seat_numbers, \
                               total_price, status, created_at, cancelled_at";
const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type (SQLite-specific)
// ---------------------------------------------------------------------------

/// SQLite keeps booking ids as TEXT.
#[derive(sqlx::FromRow)]
struct SqliteBookingRow {
    id: String,
    bus_id: i64,
    user_id: Option<String>,
    passenger_name: String,
    seats_booked: i32,
    seat_numbers: Json<Vec<i32>>,
    total_price: f64,
    status: String,
    created_at: OffsetDateTime,
    cancelled_at: Option<OffsetDateTime>,
}

impl SqliteBookingRow {
    fn into_booking(self) -> Booking {
        let id = self.id.parse::<Uuid>().unwrap_or_else(|_| {
            tracing::warn!(
                "Invalid UUID '{}' for booking on bus {}, using nil",
                self.id,
                self.bus_id
            );
            Uuid::nil()
        });

        RawBookingRow {
            id,
            bus_id: self.bus_id,
            user_id: self.user_id,
            passenger_name: self.passenger_name,
            seats_booked: self.seats_booked,
            seat_numbers: self.seat_numbers.0,
            total_price: self.total_price,
            status: self.status,
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        }
        .into_booking()
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Embedded storage for single-node deployments and tests.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Transaction that takes the write lock up front. A deferred
    /// transaction that reads before writing fails with SQLITE_BUSY instead
    /// of waiting when another connection is already writing.
    async fn begin_write(&self) -> std::result::Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }

    async fn fetch_booking(&self, id: Uuid) -> std::result::Result<Option<Booking>, sqlx::Error> {
        let row = sqlx::query_as::<_, SqliteBookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?1",
            BOOKING_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SqliteBookingRow::into_booking))
    }
}

/// Work out why the conditional seat decrement matched no row.
async fn rejection_reason(
    tx: &mut Transaction<'_, Sqlite>,
    booking: &NewBooking,
) -> Result<AppError> {
    let bus: Option<(bool, i32)> =
        sqlx::query_as("SELECT is_active, seats_available FROM buses WHERE id = ?1")
            .bind(booking.bus_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(match bus {
        None => AppError::NotFound(format!("Bus {} not found", booking.bus_id)),
        Some((false, _)) => AppError::InvalidRequest("Bus is not active".to_string()),
        Some((true, available)) => AppError::InsufficientSeats {
            requested: booking.seats,
            available,
        },
    })
}

#[async_trait]
impl RouteRepository for SqliteRepository {
    async fn list_routes(&self) -> Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes ORDER BY id",
            ROUTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn search_routes(&self, params: &RouteSearchParams) -> Result<Vec<Route>> {
        // SQLite's LIKE/lower() only fold ASCII, so filter in Rust
        Ok(self
            .list_routes()
            .await?
            .into_iter()
            .filter(|route| params.matches(route))
            .collect())
    }

    async fn get_route(&self, id: i64) -> Result<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE id = ?1",
            ROUTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Route::from))
    }

    async fn insert_route(&self, route: &NewRoute) -> Result<Route> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "INSERT INTO routes (origin, destination, distance_km, ticket_price, duration_min,
                                 coords, stops, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {}",
            ROUTE_COLUMNS
        ))
        .bind(&route.origin)
        .bind(&route.destination)
        .bind(route.distance_km)
        .bind(route.ticket_price)
        .bind(route.duration_min)
        .bind(Json(&route.coords))
        .bind(Json(&route.stops))
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete_route(&self, id: i64) -> Result<()> {
        let mut tx = self.begin_write().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM routes WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("Route {} not found", id)));
        }

        let buses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buses WHERE route_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if buses > 0 {
            return Err(AppError::Conflict(format!(
                "Route {} is still served by {} bus(es)",
                id, buses
            )));
        }

        sqlx::query("DELETE FROM routes WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BusRepository for SqliteRepository {
    async fn list_buses(&self, route_id: Option<i64>) -> Result<Vec<Bus>> {
        let rows = sqlx::query_as::<_, BusRow>(&format!(
            "SELECT {} FROM buses WHERE (?1 IS NULL OR route_id = ?1) ORDER BY id",
            BUS_COLUMNS
        ))
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Bus::from).collect())
    }

    async fn get_bus(&self, id: i64) -> Result<Option<Bus>> {
        let row = sqlx::query_as::<_, BusRow>(&format!(
            "SELECT {} FROM buses WHERE id = ?1",
            BUS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Bus::from))
    }

    async fn insert_bus(&self, bus: &NewBus) -> Result<Bus> {
        let fare = bus
            .fare
            .ok_or_else(|| AppError::InvalidRequest("fare is required".to_string()))?;

        if self.get_route(bus.route_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Route {} not found", bus.route_id)));
        }

        let row = sqlx::query_as::<_, BusRow>(&format!(
            "INSERT INTO buses (route_id, operator, total_seats, seats_available, fare, is_active,
                                created_at)
             VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6)
             RETURNING {}",
            BUS_COLUMNS
        ))
        .bind(bus.route_id)
        .bind(bus.operator.trim())
        .bind(bus.total_seats)
        .bind(fare)
        .bind(bus.is_active)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_bus(&self, id: i64, update: &BusUpdate) -> Result<Bus> {
        let row = sqlx::query_as::<_, BusRow>(&format!(
            "UPDATE buses
             SET is_active = COALESCE(?2, is_active),
                 fare = COALESCE(?3, fare)
             WHERE id = ?1
             RETURNING {}",
            BUS_COLUMNS
        ))
        .bind(id)
        .bind(update.is_active)
        .bind(update.fare)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Bus::from)
            .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))
    }
}

#[async_trait]
impl BookingRepository for SqliteRepository {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        let mut tx = self.begin_write().await?;

        if let Some(user_id) = &booking.user_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
                    .bind(user_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !exists {
                return Err(AppError::NotFound(format!("User {} not found", user_id)));
            }
        }

        let admitted: Option<(f64, i32)> = sqlx::query_as(
            "UPDATE buses
             SET seats_available = seats_available - ?2
             WHERE id = ?1 AND is_active AND seats_available >= ?2
             RETURNING fare, total_seats",
        )
        .bind(booking.bus_id)
        .bind(booking.seats)
        .fetch_optional(&mut *tx)
        .await?;

        let (fare, total_seats) = match admitted {
            Some(admitted) => admitted,
            None => return Err(rejection_reason(&mut tx, booking).await?),
        };

        let taken: Vec<Json<Vec<i32>>> = sqlx::query_scalar(
            "SELECT seat_numbers FROM bookings WHERE bus_id = ?1 AND status = ?2",
        )
        .bind(booking.bus_id)
        .bind(BookingStatus::Confirmed.to_string())
        .fetch_all(&mut *tx)
        .await?;
        let seat_numbers = allocate_seats(total_seats, &taken_seats(taken), booking)?;

        let row = sqlx::query_as::<_, SqliteBookingRow>(&format!(
            "INSERT INTO bookings (id, bus_id, user_id, passenger_name, seats_booked, seat_numbers,
                                   total_price, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(booking.bus_id)
        .bind(&booking.user_id)
        .bind(&booking.passenger_name)
        .bind(booking.seats)
        .bind(Json(&seat_numbers))
        .bind(booking_total(booking.seats, fare))
        .bind(BookingStatus::Confirmed.to_string())
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Booked seat(s) {:?} on bus {} for {}",
            seat_numbers,
            booking.bus_id,
            booking.passenger_name
        );
        Ok(row.into_booking())
    }

    async fn cancel_booking(&self, id: Uuid, request: &CancelBooking) -> Result<Booking> {
        let mut tx = self.begin_write().await?;

        let existing = sqlx::query_as::<_, SqliteBookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = ?1",
            BOOKING_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .map(SqliteBookingRow::into_booking)
        .filter(|b| request.authorizes(b.user_id.as_deref()))
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;

        if existing.status == BookingStatus::Cancelled {
            return Err(AppError::Conflict(format!(
                "Booking {} is already cancelled",
                id
            )));
        }

        let row = sqlx::query_as::<_, SqliteBookingRow>(&format!(
            "UPDATE bookings
             SET status = ?2, cancelled_at = ?3
             WHERE id = ?1 AND status = ?4
             RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id.to_string())
        .bind(BookingStatus::Cancelled.to_string())
        .bind(OffsetDateTime::now_utc())
        .bind(BookingStatus::Confirmed.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Booking {} is already cancelled", id)))?;

        sqlx::query("UPDATE buses SET seats_available = seats_available + ?2 WHERE id = ?1")
            .bind(existing.bus_id)
            .bind(existing.seats_booked)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Cancelled booking {} and released {} seat(s) on bus {}",
            id,
            existing.seats_booked,
            existing.bus_id
        );
        Ok(row.into_booking())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.fetch_booking(id).await?)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, SqliteBookingRow>(&format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC, id",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SqliteBookingRow::into_booking).collect())
    }

    async fn list_user_bookings(&self, user_id: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, SqliteBookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = ?1 ORDER BY created_at DESC, id",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SqliteBookingRow::into_booking).collect())
    }

    async fn booked_seat_numbers(&self, bus_id: i64) -> Result<Vec<i32>> {
        let rows: Vec<Json<Vec<i32>>> = sqlx::query_scalar(
            "SELECT seat_numbers FROM bookings WHERE bus_id = ?1 AND status = ?2",
        )
        .bind(bus_id)
        .bind(BookingStatus::Confirmed.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(taken_seats(rows).into_iter().collect())
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, email, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.user_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "User id or email already registered"))?;

        Ok(row.into())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users
             SET name = ?2, email = ?3, updated_at = ?4
             WHERE id = ?1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Email already registered"))?;

        row.map(User::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at, id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
#[path = "sqlite_repo_tests.rs"]
mod sqlite_repo_tests;
