use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fleet_config::DispatcherConfig;
use fleet_domain::{
    validation::{prepare_new_service, validate_supplied_metric},
    Address, AddressDirectory, ClientDirectory, DispatchError, DispatchResult, DispatchStrategy,
    DriverPool, LocationPolicy, NewService, Service, ServiceStore,
};

use crate::geo::{distance_km, eta_minutes, route_between};

/// Warning attached to a service created without a driver.
pub const NO_DRIVERS_AVAILABLE: &str = "no drivers available";

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Extra selection rounds after the first lost claim.
    pub max_claim_retries: usize,
    pub location_policy: LocationPolicy,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from(&DispatcherConfig::default())
    }
}

impl From<&DispatcherConfig> for DispatchSettings {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            max_claim_retries: config.max_claim_retries,
            location_policy: config.location_policy,
        }
    }
}

/// Raw request data for a new service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServiceRequest {
    pub pickup_address_id: i64,
    pub client_id: Option<i64>,
    /// Skips matching and claims this driver directly.
    pub driver_id: Option<i64>,
    /// Only honoured together with `driver_id`.
    pub distance: Option<f64>,
    /// Only honoured together with `driver_id`.
    pub estimated_time: Option<f64>,
}

impl ServiceRequest {
    pub fn new(pickup_address_id: i64, client_id: i64) -> Self {
        Self {
            pickup_address_id,
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn with_driver(mut self, driver_id: i64) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    pub fn with_route(mut self, distance: Option<f64>, estimated_time: Option<f64>) -> Self {
        self.distance = distance;
        self.estimated_time = estimated_time;
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DispatchOutcome {
    pub service: Service,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl DispatchOutcome {
    fn assigned(service: Service) -> Self {
        Self {
            service,
            warning: None,
        }
    }

    fn unassigned(service: Service) -> Self {
        Self {
            service,
            warning: Some(NO_DRIVERS_AVAILABLE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub eta_minutes: f64,
}

/// Turns service requests into persisted services, matching a driver when
/// the caller does not name one.
pub struct DispatchEngine {
    addresses: Arc<dyn AddressDirectory>,
    clients: Arc<dyn ClientDirectory>,
    drivers: Arc<dyn DriverPool>,
    services: Arc<dyn ServiceStore>,
    strategy: Arc<dyn DispatchStrategy>,
    settings: DispatchSettings,
}

impl DispatchEngine {
    pub fn new(
        addresses: Arc<dyn AddressDirectory>,
        clients: Arc<dyn ClientDirectory>,
        drivers: Arc<dyn DriverPool>,
        services: Arc<dyn ServiceStore>,
        strategy: Arc<dyn DispatchStrategy>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            addresses,
            clients,
            drivers,
            services,
            strategy,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub async fn create(&self, request: ServiceRequest) -> DispatchResult<DispatchOutcome> {
        let client_id = request
            .client_id
            .ok_or_else(|| DispatchError::invalid_input("client_id is required"))?;
        validate_supplied_metric(request.distance, "distance")?;
        validate_supplied_metric(request.estimated_time, "estimated_time")?;

        let pickup = self.resolve_address(request.pickup_address_id).await?;
        self.clients
            .get(client_id)
            .await?
            .ok_or_else(|| DispatchError::client_not_found(client_id))?;

        match request.driver_id {
            Some(driver_id) => {
                let service = self
                    .create_with_driver(&pickup, client_id, driver_id, &request)
                    .await?;
                Ok(DispatchOutcome::assigned(service))
            }
            None => self.create_matched(&pickup, client_id).await,
        }
    }

    /// Great-circle distance and ETA between two stored addresses.
    pub async fn distance_between(
        &self,
        from_address_id: i64,
        to_address_id: i64,
    ) -> DispatchResult<RouteEstimate> {
        let from = self.resolve_address(from_address_id).await?;
        let to = self.resolve_address(to_address_id).await?;

        let (from, to) = match (from.coordinates, to.coordinates) {
            (Some(from), Some(to)) => (from, to),
            (None, _) => return Err(missing_coordinates(from_address_id)),
            (_, None) => return Err(missing_coordinates(to_address_id)),
        };

        let distance = distance_km(from, to);
        Ok(RouteEstimate {
            distance_km: distance,
            eta_minutes: eta_minutes(distance),
        })
    }

    async fn resolve_address(&self, id: i64) -> DispatchResult<Address> {
        self.addresses
            .get(id)
            .await?
            .ok_or_else(|| DispatchError::address_not_found(id))
    }

    async fn create_with_driver(
        &self,
        pickup: &Address,
        client_id: i64,
        driver_id: i64,
        request: &ServiceRequest,
    ) -> DispatchResult<Service> {
        let driver = self
            .drivers
            .get(driver_id)
            .await?
            .ok_or_else(|| DispatchError::driver_not_found(driver_id))?;

        let home = self.addresses.get(driver.address_id).await?;
        let computed = route_between(pickup.coordinates, home.and_then(|home| home.coordinates));
        let distance = request.distance.or(computed.map(|(d, _)| d));
        let estimated_time = request.estimated_time.or(computed.map(|(_, eta)| eta));

        let mut record = NewService::pending(pickup.id, client_id)
            .with_driver(driver_id)
            .with_route(distance, estimated_time);
        prepare_new_service(&mut record)?;

        if !self.drivers.claim(driver_id).await? {
            warn!("driver {} requested explicitly but is not available", driver_id);
            return Err(DispatchError::driver_unavailable(driver_id));
        }

        self.persist_claimed(&record, driver_id).await
    }

    async fn create_matched(
        &self,
        pickup: &Address,
        client_id: i64,
    ) -> DispatchResult<DispatchOutcome> {
        let country = match self.settings.location_policy {
            LocationPolicy::CityAndCountry => Some(pickup.country.as_str()),
            LocationPolicy::CityOnly => None,
        };

        let mut lost: HashSet<i64> = HashSet::new();
        loop {
            let mut candidates = self
                .drivers
                .list_available_in_city(&pickup.city, country)
                .await?;
            candidates.retain(|candidate| !lost.contains(&candidate.driver.id));

            if candidates.is_empty() {
                return self.create_unassigned(pickup, client_id).await;
            }

            let origin = pickup.coordinates.ok_or_else(|| {
                DispatchError::invalid_input(format!(
                    "pickup address {} has no coordinates",
                    pickup.id
                ))
            })?;

            debug!(
                "scoring {} candidates in {} with {} strategy",
                candidates.len(),
                pickup.city,
                self.strategy.name()
            );
            let Some(selection) = self.strategy.select_driver(origin, &candidates) else {
                debug!("no candidate in {} has a located home address", pickup.city);
                return self.create_unassigned(pickup, client_id).await;
            };

            let mut record = NewService::pending(pickup.id, client_id)
                .with_driver(selection.driver_id)
                .with_route(
                    Some(selection.distance_km),
                    Some(eta_minutes(selection.distance_km)),
                );
            prepare_new_service(&mut record)?;

            if self.drivers.claim(selection.driver_id).await? {
                let service = self.persist_claimed(&record, selection.driver_id).await?;
                return Ok(DispatchOutcome::assigned(service));
            }

            lost.insert(selection.driver_id);
            warn!(
                "lost claim on driver {} ({} of {} retries used)",
                selection.driver_id,
                lost.len(),
                self.settings.max_claim_retries
            );
            if lost.len() > self.settings.max_claim_retries {
                return Err(DispatchError::ClaimContention {
                    attempts: lost.len(),
                });
            }
        }
    }

    async fn create_unassigned(
        &self,
        pickup: &Address,
        client_id: i64,
    ) -> DispatchResult<DispatchOutcome> {
        let mut record = NewService::pending(pickup.id, client_id);
        prepare_new_service(&mut record)?;
        let service = self.services.create(&record).await?;

        warn!(
            "service {} created without a driver: {} in {}",
            service.id, NO_DRIVERS_AVAILABLE, pickup.city
        );
        Ok(DispatchOutcome::unassigned(service))
    }

    /// Persists a record whose driver is already claimed, handing the driver
    /// back if the write fails.
    async fn persist_claimed(&self, record: &NewService, driver_id: i64) -> DispatchResult<Service> {
        match self.services.create(record).await {
            Ok(service) => {
                info!(
                    "service {} assigned to driver {} ({:?} km, {:?} min)",
                    service.id, driver_id, service.distance, service.estimated_time
                );
                Ok(service)
            }
            Err(e) => {
                if let Err(release_err) = self.drivers.release(driver_id).await {
                    warn!(
                        "failed to release driver {} after persist error: {}",
                        driver_id, release_err
                    );
                }
                Err(e)
            }
        }
    }
}

fn missing_coordinates(address_id: i64) -> DispatchError {
    DispatchError::invalid_input(format!("address {address_id} has no coordinates"))
}
