//! Fixtures shared by the dispatch tests.

use std::sync::Arc;

use fleet_domain::{Address, Client, Driver};
use fleet_infrastructure::InMemoryFleetStore;

use crate::builders::{AddressBuilder, ClientBuilder, DriverBuilder};

/// Plaza de Bolívar, Bogotá.
pub const BOGOTA_PICKUP: (f64, f64) = (4.60971, -74.08175);

/// Kilometres per degree of latitude on a 6371 km sphere.
pub const KM_PER_DEGREE_LAT: f64 = 111.19493;

/// Point `km` kilometres due north of `(latitude, longitude)`.
pub fn offset_north_km(origin: (f64, f64), km: f64) -> (f64, f64) {
    (origin.0 + km / KM_PER_DEGREE_LAT, origin.1)
}

pub struct FleetFixture {
    pub store: Arc<InMemoryFleetStore>,
    pub pickup: Address,
    pub client: Client,
}

impl FleetFixture {
    /// Empty store with a Bogotá pickup address (id 1) and client (id 1).
    pub async fn bogota() -> Self {
        let store = Arc::new(InMemoryFleetStore::new());
        let pickup = store
            .insert_address(
                AddressBuilder::new()
                    .with_id(1)
                    .with_coordinates(BOGOTA_PICKUP.0, BOGOTA_PICKUP.1)
                    .build(),
            )
            .await;
        let client = store
            .insert_client(ClientBuilder::new().with_id(1).with_address(pickup.id).build())
            .await;
        Self {
            store,
            pickup,
            client,
        }
    }

    /// Adds an available driver whose home lies `km` north of the pickup,
    /// in the same city. The home address gets id `100 + driver_id`.
    pub async fn add_driver_north(&self, driver_id: i64, km: f64) -> Driver {
        let (lat, lon) = offset_north_km(BOGOTA_PICKUP, km);
        self.add_driver_at(driver_id, "Bogotá", "Colombia", Some((lat, lon)))
            .await
    }

    pub async fn add_driver_at(
        &self,
        driver_id: i64,
        city: &str,
        country: &str,
        coordinates: Option<(f64, f64)>,
    ) -> Driver {
        let builder = AddressBuilder::new()
            .with_id(100 + driver_id)
            .with_name(&format!("Home of driver {driver_id}"))
            .with_city(city)
            .with_country(country);
        let builder = match coordinates {
            Some((lat, lon)) => builder.with_coordinates(lat, lon),
            None => builder.without_coordinates(),
        };
        let home = self.store.insert_address(builder.build()).await;
        self.store
            .insert_driver(DriverBuilder::new().with_id(driver_id).with_home(home.id).build())
            .await
    }
}
