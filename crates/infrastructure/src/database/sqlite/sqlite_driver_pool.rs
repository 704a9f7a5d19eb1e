use async_trait::async_trait;
use fleet_domain::{Driver, DriverCandidate, DriverPool};
use fleet_errors::DispatchResult;
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::mapping::{MappingHelpers, DRIVER_COLUMNS};

/// Driver table adapter. Availability changes go through single conditional
/// `UPDATE` statements so concurrent claims cannot both succeed.
pub struct SqliteDriverPool {
    pool: SqlitePool,
}

impl SqliteDriverPool {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, driver: &Driver) -> DispatchResult<Driver> {
        let result = sqlx::query(
            "INSERT INTO drivers (id, name, phone, address_id, is_available) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(MappingHelpers::explicit_id(driver.id))
        .bind(&driver.name)
        .bind(&driver.phone)
        .bind(driver.address_id)
        .bind(driver.is_available)
        .execute(&self.pool)
        .await?;

        let stored = Driver {
            id: result.last_insert_rowid(),
            ..driver.clone()
        };
        debug!("inserted driver {}", stored.id);
        Ok(stored)
    }
}

#[async_trait]
impl DriverPool for SqliteDriverPool {
    async fn get(&self, id: i64) -> DispatchResult<Option<Driver>> {
        let row = sqlx::query(&format!("SELECT {DRIVER_COLUMNS} FROM drivers WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| MappingHelpers::driver_from_row(&row, ""))
            .transpose()
    }

    async fn list_available_in_city(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> DispatchResult<Vec<DriverCandidate>> {
        // LOWER() only folds ASCII in SQLite, so the location match is done on
        // the Rust side with full Unicode case folding.
        let rows = sqlx::query(
            r#"
            SELECT d.id, d.name, d.phone, d.address_id, d.is_available,
                   a.id AS home_id, a.name AS home_name, a.country AS home_country,
                   a.city AS home_city, a.street AS home_street,
                   a.latitude AS home_latitude, a.longitude AS home_longitude
            FROM drivers d
            JOIN addresses a ON a.id = d.address_id
            WHERE d.is_available = 1
            ORDER BY d.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::new();
        for row in rows {
            let home = MappingHelpers::address_from_row(&row, "home_")?;
            if !home.is_located_in(city, country) {
                continue;
            }
            candidates.push(DriverCandidate {
                driver: MappingHelpers::driver_from_row(&row, "")?,
                home,
            });
        }

        debug!(
            "{} available drivers in {} ({:?})",
            candidates.len(),
            city,
            country
        );
        Ok(candidates)
    }

    async fn claim(&self, id: i64) -> DispatchResult<bool> {
        let result =
            sqlx::query("UPDATE drivers SET is_available = 0 WHERE id = ? AND is_available = 1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        let claimed = result.rows_affected() == 1;
        debug!("claim driver {}: {}", id, claimed);
        Ok(claimed)
    }

    async fn release(&self, id: i64) -> DispatchResult<()> {
        sqlx::query("UPDATE drivers SET is_available = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!("released driver {}", id);
        Ok(())
    }
}
