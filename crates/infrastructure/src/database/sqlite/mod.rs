pub mod sqlite_address_directory;
pub mod sqlite_client_directory;
pub mod sqlite_driver_pool;
pub mod sqlite_service_store;

pub use sqlite_address_directory::SqliteAddressDirectory;
pub use sqlite_client_directory::SqliteClientDirectory;
pub use sqlite_driver_pool::SqliteDriverPool;
pub use sqlite_service_store::SqliteServiceStore;

use anyhow::{Context, Result};
use fleet_config::DatabaseConfig;
use sqlx::{sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        country TEXT NOT NULL,
        city TEXT NOT NULL,
        street TEXT,
        latitude REAL CHECK (latitude BETWEEN -90 AND 90),
        longitude REAL CHECK (longitude BETWEEN -180 AND 180),
        CHECK ((latitude IS NULL) = (longitude IS NULL))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone TEXT NOT NULL UNIQUE,
        email TEXT UNIQUE,
        address_id INTEGER NOT NULL REFERENCES addresses(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS drivers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone TEXT NOT NULL UNIQUE,
        address_id INTEGER NOT NULL REFERENCES addresses(id),
        is_available BOOLEAN NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        pickup_address_id INTEGER NOT NULL REFERENCES addresses(id),
        client_id INTEGER NOT NULL REFERENCES clients(id),
        driver_id INTEGER REFERENCES drivers(id),
        status TEXT NOT NULL DEFAULT 'pending'
            CHECK (status IN ('pending', 'in_progress', 'completed', 'canceled')),
        estimated_time REAL,
        distance REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_drivers_available ON drivers(is_available)",
    "CREATE INDEX IF NOT EXISTS idx_services_status ON services(status)",
];

/// Owns the SQLite pool shared by every adapter.
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .with_context(|| format!("invalid database url: {}", config.url))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .max_lifetime(Duration::from_secs(1800))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to {}", config.url))?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the tables if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("schema migration failed")?;
        }
        info!("database schema is up to date");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
