use async_trait::async_trait;
use fleet_domain::{Address, AddressDirectory};
use fleet_errors::DispatchResult;
use sqlx::SqlitePool;
use tracing::debug;

use crate::database::mapping::{MappingHelpers, ADDRESS_COLUMNS};

pub struct SqliteAddressDirectory {
    pool: SqlitePool,
}

impl SqliteAddressDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts an address and returns it with its stored id.
    pub async fn insert(&self, address: &Address) -> DispatchResult<Address> {
        let (latitude, longitude) = match address.coordinates {
            Some(c) => (Some(c.latitude), Some(c.longitude)),
            None => (None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO addresses (id, name, country, city, street, latitude, longitude)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(MappingHelpers::explicit_id(address.id))
        .bind(&address.name)
        .bind(&address.country)
        .bind(&address.city)
        .bind(&address.street)
        .bind(latitude)
        .bind(longitude)
        .execute(&self.pool)
        .await?;

        let stored = Address {
            id: result.last_insert_rowid(),
            ..address.clone()
        };
        debug!("inserted address {} in {}", stored.id, stored.city);
        Ok(stored)
    }
}

#[async_trait]
impl AddressDirectory for SqliteAddressDirectory {
    async fn get(&self, id: i64) -> DispatchResult<Option<Address>> {
        let row = sqlx::query(&format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| MappingHelpers::address_from_row(&row, ""))
            .transpose()
    }
}
