use crate::constants::{DB_ACQUIRE_TIMEOUT_SECONDS, DB_MAX_CONNECTIONS};
use crate::error::{AppError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

mod booking_queries;
pub mod repository;
mod route_queries;
pub mod sqlite_repo;

pub use repository::{
    BookingRepository, BusRepository, PgRepository, Repository, RouteRepository, UserRepository,
};
pub use sqlite_repo::SqliteRepository;

pub async fn create_pool(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECONDS))
        .connect(database_url)
        .await
}

/// Open a SQLite database, creating the file if needed. In-memory databases
/// are per-connection, so they get a single-connection pool. File databases
/// run in WAL mode so readers never block the single writer.
pub async fn create_sqlite_pool(database_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    let in_memory = is_in_memory(database_url);
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECONDS));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }
    let max_connections = if in_memory { 1 } else { DB_MAX_CONNECTIONS };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(DB_ACQUIRE_TIMEOUT_SECONDS))
        .connect_with(options)
        .await
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

pub async fn migrate_postgres(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("PostgreSQL migration failed: {}", e)))
}

pub async fn migrate_sqlite(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("SQLite migration failed: {}", e)))
}

/// Connect to the database named by `database_url`, run its migrations and
/// return the matching repository. `sqlite:` URLs select the embedded
/// backend; everything else is treated as PostgreSQL.
pub async fn connect(database_url: &str) -> Result<Arc<dyn Repository>> {
    if database_url.starts_with("sqlite:") {
        let pool = create_sqlite_pool(database_url).await?;
        migrate_sqlite(&pool).await?;
        Ok(Arc::new(SqliteRepository::new(pool)))
    } else {
        let pool = create_pool(database_url).await?;
        migrate_postgres(&pool).await?;
        Ok(Arc::new(PgRepository::new(pool)))
    }
}
