use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use fleet_domain::{
    Address, AddressDirectory, Client, ClientDirectory, Driver, DriverCandidate, DriverPool,
    NewService, Service, ServiceFilter, ServicePatch, ServiceStore,
};
use fleet_errors::{DispatchError, DispatchResult};

/// Implements every dispatch port over `RwLock`-guarded tables. Used by the
/// tests and for running the engine without a database. `claim` checks and
/// flips availability under one write lock, so concurrent claims on the same
/// driver have exactly one winner.
#[derive(Debug, Default)]
pub struct InMemoryFleetStore {
    addresses: RwLock<BTreeMap<i64, Address>>,
    clients: RwLock<BTreeMap<i64, Client>>,
    drivers: RwLock<BTreeMap<i64, Driver>>,
    services: RwLock<BTreeMap<i64, Service>>,
}

fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |last| last + 1)
}

impl InMemoryFleetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `address`, assigning the next id when `address.id` is not positive.
    pub async fn insert_address(&self, mut address: Address) -> Address {
        let mut addresses = self.addresses.write().await;
        if address.id <= 0 {
            address.id = next_id(&addresses);
        }
        addresses.insert(address.id, address.clone());
        address
    }

    pub async fn insert_client(&self, mut client: Client) -> Client {
        let mut clients = self.clients.write().await;
        if client.id <= 0 {
            client.id = next_id(&clients);
        }
        clients.insert(client.id, client.clone());
        client
    }

    pub async fn insert_driver(&self, mut driver: Driver) -> Driver {
        let mut drivers = self.drivers.write().await;
        if driver.id <= 0 {
            driver.id = next_id(&drivers);
        }
        drivers.insert(driver.id, driver.clone());
        driver
    }

    /// Stores a fully formed service as-is. Fixture helper; bypasses validation.
    pub async fn insert_service(&self, service: Service) -> Service {
        self.services
            .write()
            .await
            .insert(service.id, service.clone());
        service
    }

    pub async fn available_driver_count(&self) -> usize {
        self.drivers
            .read()
            .await
            .values()
            .filter(|driver| driver.is_available)
            .count()
    }
}

#[async_trait]
impl AddressDirectory for InMemoryFleetStore {
    async fn get(&self, id: i64) -> DispatchResult<Option<Address>> {
        Ok(self.addresses.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl ClientDirectory for InMemoryFleetStore {
    async fn get(&self, id: i64) -> DispatchResult<Option<Client>> {
        Ok(self.clients.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl DriverPool for InMemoryFleetStore {
    async fn get(&self, id: i64) -> DispatchResult<Option<Driver>> {
        Ok(self.drivers.read().await.get(&id).cloned())
    }

    async fn list_available_in_city(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> DispatchResult<Vec<DriverCandidate>> {
        let available: Vec<Driver> = self
            .drivers
            .read()
            .await
            .values()
            .filter(|driver| driver.is_available)
            .cloned()
            .collect();

        let addresses = self.addresses.read().await;
        let candidates = available
            .into_iter()
            .filter_map(|driver| {
                let home = addresses.get(&driver.address_id)?;
                home.is_located_in(city, country).then(|| DriverCandidate {
                    home: home.clone(),
                    driver,
                })
            })
            .collect();
        Ok(candidates)
    }

    async fn claim(&self, id: i64) -> DispatchResult<bool> {
        let mut drivers = self.drivers.write().await;
        match drivers.get_mut(&id) {
            Some(driver) if driver.is_available => {
                driver.is_available = false;
                debug!("driver {} claimed", id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, id: i64) -> DispatchResult<()> {
        if let Some(driver) = self.drivers.write().await.get_mut(&id) {
            driver.is_available = true;
            debug!("driver {} released", id);
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceStore for InMemoryFleetStore {
    async fn create(&self, record: &NewService) -> DispatchResult<Service> {
        let mut services = self.services.write().await;
        let now = Utc::now();
        let service = Service {
            id: next_id(&services),
            pickup_address_id: record.pickup_address_id,
            client_id: record.client_id,
            driver_id: record.driver_id,
            status: record.status,
            estimated_time: record.estimated_time,
            distance: record.distance,
            created_at: now,
            updated_at: now,
        };
        services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn get(&self, id: i64) -> DispatchResult<Option<Service>> {
        Ok(self.services.read().await.get(&id).cloned())
    }

    async fn update(&self, id: i64, patch: &ServicePatch) -> DispatchResult<Service> {
        let mut services = self.services.write().await;
        let service = services
            .get_mut(&id)
            .ok_or_else(|| DispatchError::service_not_found(id))?;

        if let Some(conflict) = patch.conflict_with(service) {
            return Err(conflict);
        }

        patch.apply_to(service);
        service.updated_at = Utc::now();
        Ok(service.clone())
    }

    async fn list(&self, filter: &ServiceFilter) -> DispatchResult<Vec<Service>> {
        let mut services: Vec<Service> = self
            .services
            .read()
            .await
            .values()
            .filter(|service| filter.matches(service))
            .cloned()
            .collect();
        services.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(services)
    }
}
