use super::repository::{BusRow, RouteRow};
use crate::error::{AppError, Result};
use crate::models::{Bus, BusUpdate, NewBus, NewRoute, Route};
use sqlx::types::Json;
use sqlx::PgPool;
use time::OffsetDateTime;

const ROUTE_COLUMNS: &str = "id, origin, destination, distance_km, ticket_price, duration_min, \
                             coords, stops, created_at";

const BUS_COLUMNS: &str =
    "id, route_id, operator, total_seats, seats_available, fare, is_active, created_at";

/// All routes in insertion order
pub async fn list_routes(pool: &PgPool) -> std::result::Result<Vec<Route>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {} FROM routes ORDER BY id",
        ROUTE_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Route::from).collect())
}

/// Case-insensitive substring search on either endpoint.
/// `None` patterns match everything.
pub async fn search_routes(
    pool: &PgPool,
    origin: Option<&str>,
    destination: Option<&str>,
) -> std::result::Result<Vec<Route>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        r#"
        SELECT {}
        FROM routes
        WHERE ($1::text IS NULL OR origin ILIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR destination ILIKE '%' || $2 || '%')
        ORDER BY id
        "#,
        ROUTE_COLUMNS
    ))
    .bind(origin.map(escape_like))
    .bind(destination.map(escape_like))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Route::from).collect())
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn get_route(pool: &PgPool, id: i64) -> std::result::Result<Option<Route>, sqlx::Error> {
    let row = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {} FROM routes WHERE id = $1",
        ROUTE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Route::from))
}

pub async fn insert_route(pool: &PgPool, route: &NewRoute) -> std::result::Result<Route, sqlx::Error> {
    let row = sqlx::query_as::<_, RouteRow>(&format!(
        r#"
        INSERT INTO routes (origin, destination, distance_km, ticket_price, duration_min,
                            coords, stops, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
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
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn delete_route(pool: &PgPool, id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM routes WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Route {} not found", id)));
    }

    let buses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buses WHERE route_id = $1")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if buses > 0 {
        return Err(AppError::Conflict(format!(
            "Route {} is still served by {} bus(es)",
            id, buses
        )));
    }

    sqlx::query("DELETE FROM routes WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn list_buses(
    pool: &PgPool,
    route_id: Option<i64>,
) -> std::result::Result<Vec<Bus>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BusRow>(&format!(
        "SELECT {} FROM buses WHERE ($1::bigint IS NULL OR route_id = $1) ORDER BY id",
        BUS_COLUMNS
    ))
    .bind(route_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Bus::from).collect())
}

pub async fn get_bus(pool: &PgPool, id: i64) -> std::result::Result<Option<Bus>, sqlx::Error> {
    let row = sqlx::query_as::<_, BusRow>(&format!(
        "SELECT {} FROM buses WHERE id = $1",
        BUS_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Bus::from))
}

pub async fn insert_bus(pool: &PgPool, bus: &NewBus) -> Result<Bus> {
    let fare = bus
        .fare
        .ok_or_else(|| AppError::InvalidRequest("fare is required".to_string()))?;

    let route_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM routes WHERE id = $1)")
            .bind(bus.route_id)
            .fetch_one(pool)
            .await?;
    if !route_exists {
        return Err(AppError::NotFound(format!("Route {} not found", bus.route_id)));
    }

    let row = sqlx::query_as::<_, BusRow>(&format!(
        r#"
        INSERT INTO buses (route_id, operator, total_seats, seats_available, fare, is_active, created_at)
        VALUES ($1, $2, $3, $3, $4, $5, $6)
        RETURNING {}
        "#,
        BUS_COLUMNS
    ))
    .bind(bus.route_id)
    .bind(bus.operator.trim())
    .bind(bus.total_seats)
    .bind(fare)
    .bind(bus.is_active)
    .bind(OffsetDateTime::now_utc())
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn update_bus(pool: &PgPool, id: i64, update: &BusUpdate) -> Result<Bus> {
    let row = sqlx::query_as::<_, BusRow>(&format!(
        r#"
        UPDATE buses
        SET is_active = COALESCE($2, is_active),
            fare = COALESCE($3, fare)
        WHERE id = $1
        RETURNING {}
        "#,
        BUS_COLUMNS
    ))
    .bind(id)
    .bind(update.is_active)
    .bind(update.fare)
    .fetch_optional(pool)
    .await?;

    row.map(Bus::from)
        .ok_or_else(|| AppError::NotFound(format!("Bus {} not found", id)))
}
