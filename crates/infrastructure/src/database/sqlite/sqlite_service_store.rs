use async_trait::async_trait;
use chrono::Utc;
use fleet_domain::{NewService, Service, ServiceFilter, ServicePatch, ServiceStore};
use fleet_errors::{DispatchError, DispatchResult};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::database::mapping::{MappingHelpers, SERVICE_COLUMNS};

pub struct SqliteServiceStore {
    pool: SqlitePool,
}

impl SqliteServiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> DispatchResult<Option<Service>> {
        let row = sqlx::query(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| MappingHelpers::service_from_row(&row))
            .transpose()
    }
}

#[async_trait]
impl ServiceStore for SqliteServiceStore {
    async fn create(&self, record: &NewService) -> DispatchResult<Service> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO services (pickup_address_id, client_id, driver_id, status, estimated_time, distance, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.pickup_address_id)
        .bind(record.client_id)
        .bind(record.driver_id)
        .bind(record.status)
        .bind(record.estimated_time)
        .bind(record.distance)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("created service {} ({})", id, record.status);
        self.fetch(id)
            .await?
            .ok_or_else(|| DispatchError::Internal(format!("service {id} vanished after insert")))
    }

    async fn get(&self, id: i64) -> DispatchResult<Option<Service>> {
        self.fetch(id).await
    }

    async fn update(&self, id: i64, patch: &ServicePatch) -> DispatchResult<Service> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE services SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(status) = patch.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(driver_id) = patch.driver_id {
            builder.push(", driver_id = ").push_bind(driver_id);
        }
        if let Some(distance) = patch.distance {
            builder.push(", distance = ").push_bind(distance);
        }
        if let Some(estimated_time) = patch.estimated_time {
            builder.push(", estimated_time = ").push_bind(estimated_time);
        }
        builder.push(" WHERE id = ").push_bind(id);
        if let Some(expected) = patch.expected_status {
            builder.push(" AND status = ").push_bind(expected);
        }
        if let Some(expected_driver) = patch.expected_driver_id {
            builder.push(" AND driver_id IS ").push_bind(expected_driver);
        }

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 1 {
            debug!("updated service {}", id);
            return self
                .fetch(id)
                .await?
                .ok_or_else(|| DispatchError::service_not_found(id));
        }

        // Nothing matched: either the row is gone or it moved on.
        match self.fetch(id).await? {
            None => Err(DispatchError::service_not_found(id)),
            Some(current) => Err(patch.conflict_with(&current).unwrap_or_else(|| {
                DispatchError::StaleService {
                    id,
                    expected: "unchanged record".to_string(),
                    actual: current.status.to_string(),
                }
            })),
        }
    }

    async fn list(&self, filter: &ServiceFilter) -> DispatchResult<Vec<Service>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SERVICE_COLUMNS} FROM services WHERE 1 = 1"));
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(driver_id) = filter.driver_id {
            builder.push(" AND driver_id = ").push_bind(driver_id);
        }
        if let Some(client_id) = filter.client_id {
            builder.push(" AND client_id = ").push_bind(client_id);
        }
        builder.push(" ORDER BY created_at DESC, id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(MappingHelpers::service_from_row).collect()
    }
}
