pub mod classes;
pub mod courses;
pub mod enrollments;
pub mod lecturers;
pub mod students;
pub mod validate;
pub mod waitlist;

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Opens the pool with foreign keys enforced and applies migrations.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database ready at {}", database_url);

    Ok(pool)
}

/// Opens a write transaction holding SQLite's write lock from the start, so
/// validation reads and the following write see the same committed state.
/// Concurrent writers queue on the lock for up to `BUSY_TIMEOUT`.
pub async fn begin_write(db: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    db.begin_with("BEGIN IMMEDIATE").await
}

/// Next `updated_at` value. Always strictly later than `previous`, even when
/// the clock has not moved since the last write.
pub fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> SqlitePool {
    // one connection: every connection to :memory: is a separate database
    init_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to create test db")
}
