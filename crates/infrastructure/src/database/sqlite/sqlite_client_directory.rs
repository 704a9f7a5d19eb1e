use async_trait::async_trait;
use fleet_domain::{Client, ClientDirectory};
use fleet_errors::DispatchResult;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::database::mapping::MappingHelpers;

pub struct SqliteClientDirectory {
    pool: SqlitePool,
}

impl SqliteClientDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, client: &Client) -> DispatchResult<Client> {
        let result = sqlx::query(
            r#"
            INSERT INTO clients (id, name, phone, email, address_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(MappingHelpers::explicit_id(client.id))
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(client.address_id)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        let stored = Client {
            id: result.last_insert_rowid(),
            ..client.clone()
        };
        debug!("inserted client {}", stored.id);
        Ok(stored)
    }
}

#[async_trait]
impl ClientDirectory for SqliteClientDirectory {
    async fn get(&self, id: i64) -> DispatchResult<Option<Client>> {
        let row = sqlx::query(
            "SELECT id, name, phone, email, address_id, created_at, updated_at FROM clients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Client {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                phone: row.try_get("phone")?,
                email: row.try_get("email")?,
                address_id: row.try_get("address_id")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })),
            None => Ok(None),
        }
    }
}
