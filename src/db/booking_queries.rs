use super::repository::{allocate_seats, booking_total, taken_seats, RawBookingRow, UserRow};
use crate::error::{AppError, Result};
use crate::models::{
    Booking, BookingStatus, CancelBooking, NewBooking, NewUser, User, UserUpdate,
};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "id, bus_id, user_id, passenger_name, seats_booked, seat_numbers, \
                               total_price, status, created_at, cancelled_at";

const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PgBookingRow {
    id: Uuid,
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

impl From<PgBookingRow> for Booking {
    fn from(row: PgBookingRow) -> Self {
        RawBookingRow {
            id: row.id,
            bus_id: row.bus_id,
            user_id: row.user_id,
            passenger_name: row.passenger_name,
            seats_booked: row.seats_booked,
            seat_numbers: row.seat_numbers.0,
            total_price: row.total_price,
            status: row.status,
            created_at: row.created_at,
            cancelled_at: row.cancelled_at,
        }
        .into_booking()
    }
}

pub async fn create_booking(pool: &PgPool, booking: &NewBooking) -> Result<Booking> {
    let mut tx = pool.begin().await?;

    if let Some(user_id) = &booking.user_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
    }

    // The row lock taken here serialises seat allocation per bus
    let admitted: Option<(f64, i32)> = sqlx::query_as(
        r#"
        UPDATE buses
        SET seats_available = seats_available - $2
        WHERE id = $1 AND is_active AND seats_available >= $2
        RETURNING fare, total_seats
        "#,
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
        "SELECT seat_numbers FROM bookings WHERE bus_id = $1 AND status = $2",
    )
    .bind(booking.bus_id)
    .bind(BookingStatus::Confirmed.to_string())
    .fetch_all(&mut *tx)
    .await?;
    let seat_numbers = allocate_seats(total_seats, &taken_seats(taken), booking)?;

    let row = sqlx::query_as::<_, PgBookingRow>(&format!(
        r#"
        INSERT INTO bookings (id, bus_id, user_id, passenger_name, seats_booked, seat_numbers,
                              total_price, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        BOOKING_COLUMNS
    ))
    .bind(Uuid::new_v4())
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
    Ok(row.into())
}

/// Work out why the conditional seat decrement matched no row.
async fn rejection_reason(
    tx: &mut Transaction<'_, Postgres>,
    booking: &NewBooking,
) -> Result<AppError> {
    let bus: Option<(bool, i32)> =
        sqlx::query_as("SELECT is_active, seats_available FROM buses WHERE id = $1")
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

pub async fn cancel_booking(pool: &PgPool, id: Uuid, request: &CancelBooking) -> Result<Booking> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, PgBookingRow>(&format!(
        "SELECT {} FROM bookings WHERE id = $1 FOR UPDATE",
        BOOKING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .map(Booking::from)
    .filter(|b| request.authorizes(b.user_id.as_deref()))
    .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))?;

    if existing.status == BookingStatus::Cancelled {
        return Err(AppError::Conflict(format!(
            "Booking {} is already cancelled",
            id
        )));
    }

    let row = sqlx::query_as::<_, PgBookingRow>(&format!(
        r#"
        UPDATE bookings
        SET status = $2, cancelled_at = $3
        WHERE id = $1 AND status = $4
        RETURNING {}
        "#,
        BOOKING_COLUMNS
    ))
    .bind(id)
    .bind(BookingStatus::Cancelled.to_string())
    .bind(OffsetDateTime::now_utc())
    .bind(BookingStatus::Confirmed.to_string())
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::Conflict(format!("Booking {} is already cancelled", id)))?;

    sqlx::query("UPDATE buses SET seats_available = seats_available + $2 WHERE id = $1")
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
    Ok(row.into())
}

pub async fn get_booking(pool: &PgPool, id: Uuid) -> std::result::Result<Option<Booking>, sqlx::Error> {
    let row = sqlx::query_as::<_, PgBookingRow>(&format!(
        "SELECT {} FROM bookings WHERE id = $1",
        BOOKING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Booking::from))
}

/// Newest first; `user_id` narrows to one user's bookings.
pub async fn list_bookings(
    pool: &PgPool,
    user_id: Option<&str>,
) -> std::result::Result<Vec<Booking>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PgBookingRow>(&format!(
        r#"
        SELECT {}
        FROM bookings
        WHERE ($1::text IS NULL OR user_id = $1)
        ORDER BY created_at DESC, id
        "#,
        BOOKING_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Booking::from).collect())
}

pub async fn booked_seat_numbers(
    pool: &PgPool,
    bus_id: i64,
) -> std::result::Result<Vec<i32>, sqlx::Error> {
    let rows: Vec<Json<Vec<i32>>> = sqlx::query_scalar(
        "SELECT seat_numbers FROM bookings WHERE bus_id = $1 AND status = $2",
    )
    .bind(bus_id)
    .bind(BookingStatus::Confirmed.to_string())
    .fetch_all(pool)
    .await?;

    Ok(taken_seats(rows).into_iter().collect())
}

pub async fn create_user(pool: &PgPool, user: &NewUser) -> Result<User> {
    let now = OffsetDateTime::now_utc();
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, name, email, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(&user.user_id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "User id or email already registered"))?;

    Ok(row.into())
}

pub async fn get_user(pool: &PgPool, id: &str) -> std::result::Result<Option<User>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

pub async fn update_user(pool: &PgPool, id: &str, update: &UserUpdate) -> Result<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        UPDATE users
        SET name = $2, email = $3, updated_at = $4
        WHERE id = $1
        RETURNING {}
        "#,
        USER_COLUMNS
    ))
    .bind(id)
    .bind(&update.name)
    .bind(&update.email)
    .bind(OffsetDateTime::now_utc())
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "Email already registered"))?;

    row.map(User::from)
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

pub async fn list_users(pool: &PgPool) -> std::result::Result<Vec<User>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users ORDER BY created_at, id",
        USER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}
