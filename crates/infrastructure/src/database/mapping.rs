//! Row mapping shared by the SQLite adapters.

use fleet_domain::{Address, Coordinates, Driver, Service};
use fleet_errors::DispatchResult;
use sqlx::{sqlite::SqliteRow, Row};

pub const ADDRESS_COLUMNS: &str = "id, name, country, city, street, latitude, longitude";
pub const DRIVER_COLUMNS: &str = "id, name, phone, address_id, is_available";
pub const SERVICE_COLUMNS: &str =
    "id, pickup_address_id, client_id, driver_id, status, estimated_time, distance, created_at, updated_at";

pub struct MappingHelpers;

impl MappingHelpers {
    /// Reads an address whose columns may carry a `prefix` (for joined queries).
    pub fn address_from_row(row: &SqliteRow, prefix: &str) -> DispatchResult<Address> {
        let column = |name: &str| format!("{prefix}{name}");
        let latitude: Option<f64> = row.try_get(column("latitude").as_str())?;
        let longitude: Option<f64> = row.try_get(column("longitude").as_str())?;

        Ok(Address {
            id: row.try_get(column("id").as_str())?,
            name: row.try_get(column("name").as_str())?,
            country: row.try_get(column("country").as_str())?,
            city: row.try_get(column("city").as_str())?,
            street: row.try_get(column("street").as_str())?,
            coordinates: Coordinates::from_parts(latitude, longitude)?,
        })
    }

    pub fn driver_from_row(row: &SqliteRow, prefix: &str) -> DispatchResult<Driver> {
        let column = |name: &str| format!("{prefix}{name}");
        Ok(Driver {
            id: row.try_get(column("id").as_str())?,
            name: row.try_get(column("name").as_str())?,
            phone: row.try_get(column("phone").as_str())?,
            address_id: row.try_get(column("address_id").as_str())?,
            is_available: row.try_get(column("is_available").as_str())?,
        })
    }

    pub fn service_from_row(row: &SqliteRow) -> DispatchResult<Service> {
        Ok(Service {
            id: row.try_get("id")?,
            pickup_address_id: row.try_get("pickup_address_id")?,
            client_id: row.try_get("client_id")?,
            driver_id: row.try_get("driver_id")?,
            status: row.try_get("status")?,
            estimated_time: row.try_get("estimated_time")?,
            distance: row.try_get("distance")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Positive ids are kept, anything else lets SQLite assign the rowid.
    pub fn explicit_id(id: i64) -> Option<i64> {
        (id > 0).then_some(id)
    }
}
