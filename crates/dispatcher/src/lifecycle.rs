use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use fleet_domain::{
    validation::prepare_patch, AddressDirectory, DispatchError, DispatchResult, DriverPool,
    Service, ServiceFilter, ServicePatch, ServiceStatus, ServiceStore,
};

use crate::geo::route_between;

#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct ServiceStatusSummary {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub canceled: usize,
}

impl ServiceStatusSummary {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.canceled
    }
    pub fn active(&self) -> usize {
        self.pending + self.in_progress
    }
    pub fn finished(&self) -> usize {
        self.completed + self.canceled
    }
}

/// Status changes after creation. Every write is a compare-and-set on the
/// status observed at the start of the operation, and driver availability
/// is only touched through `claim` / `release`.
pub struct ServiceLifecycle {
    addresses: Arc<dyn AddressDirectory>,
    drivers: Arc<dyn DriverPool>,
    services: Arc<dyn ServiceStore>,
}

impl ServiceLifecycle {
    pub fn new(
        addresses: Arc<dyn AddressDirectory>,
        drivers: Arc<dyn DriverPool>,
        services: Arc<dyn ServiceStore>,
    ) -> Self {
        Self {
            addresses,
            drivers,
            services,
        }
    }

    pub async fn get(&self, service_id: i64) -> DispatchResult<Service> {
        self.services
            .get(service_id)
            .await?
            .ok_or_else(|| DispatchError::service_not_found(service_id))
    }

    pub async fn list(&self, filter: &ServiceFilter) -> DispatchResult<Vec<Service>> {
        self.services.list(filter).await
    }

    pub async fn status_summary(&self) -> DispatchResult<ServiceStatusSummary> {
        let services = self.services.list(&ServiceFilter::default()).await?;
        let mut summary = ServiceStatusSummary::default();
        for service in &services {
            match service.status {
                ServiceStatus::Pending => summary.pending += 1,
                ServiceStatus::InProgress => summary.in_progress += 1,
                ServiceStatus::Completed => summary.completed += 1,
                ServiceStatus::Canceled => summary.canceled += 1,
            }
        }
        Ok(summary)
    }

    /// Marks an `in_progress` service completed by its assigned driver and
    /// frees that driver.
    pub async fn complete(&self, driver_id: i64, service_id: i64) -> DispatchResult<Service> {
        let service = self.get(service_id).await?;

        if service.is_finished() {
            return Err(DispatchError::ServiceFinalized {
                id: service.id,
                status: service.status.to_string(),
            });
        }
        if !service.is_assigned_to(driver_id) {
            warn!(
                "driver {} tried to complete service {} assigned to {:?}",
                driver_id, service.id, service.driver_id
            );
            return Err(DispatchError::DriverMismatch {
                service_id: service.id,
                driver_id,
            });
        }
        if service.status != ServiceStatus::InProgress {
            return Err(DispatchError::invalid_transition(
                service.id,
                service.status,
                "complete",
            ));
        }

        let mut patch = ServicePatch::expecting(ServiceStatus::InProgress)
            .status(ServiceStatus::Completed);
        prepare_patch(&service, &mut patch)?;
        let updated = self.services.update(service.id, &patch).await?;

        self.release_after_commit(driver_id, updated.id).await;
        info!("service {} completed by driver {}", updated.id, driver_id);
        Ok(updated)
    }

    /// Moves a live service to `new_driver_id`, recomputing the route from
    /// the new driver's home. The previous driver, if any, is released.
    pub async fn reassign(&self, service_id: i64, new_driver_id: i64) -> DispatchResult<Service> {
        let service = self.get(service_id).await?;
        let driver = self
            .drivers
            .get(new_driver_id)
            .await?
            .ok_or_else(|| DispatchError::driver_not_found(new_driver_id))?;

        let pickup = self.addresses.get(service.pickup_address_id).await?;
        let home = self.addresses.get(driver.address_id).await?;
        let route = route_between(
            pickup.and_then(|a| a.coordinates),
            home.and_then(|a| a.coordinates),
        );

        let mut patch = ServicePatch::default()
            .driver(Some(new_driver_id))
            .route(route.map(|(d, _)| d), route.map(|(_, eta)| eta));
        prepare_patch(&service, &mut patch)?;

        if !self.drivers.claim(new_driver_id).await? {
            return Err(DispatchError::driver_unavailable(new_driver_id));
        }

        let updated = match self.services.update(service.id, &patch).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Err(release_err) = self.drivers.release(new_driver_id).await {
                    warn!(
                        "failed to release driver {} after reassign error: {}",
                        new_driver_id, release_err
                    );
                }
                return Err(e);
            }
        };

        if let Some(previous) = service.driver_id.filter(|id| *id != new_driver_id) {
            self.release_after_commit(previous, service.id).await;
            debug!("released previous driver {} of service {}", previous, service.id);
        }

        info!(
            "service {} reassigned from {:?} to driver {}",
            updated.id, service.driver_id, new_driver_id
        );
        Ok(updated)
    }

    /// Cancels a live service and frees its driver. The driver reference is
    /// kept on the record.
    pub async fn cancel(&self, service_id: i64) -> DispatchResult<Service> {
        let service = self.get(service_id).await?;

        let mut patch = ServicePatch::default().status(ServiceStatus::Canceled);
        prepare_patch(&service, &mut patch)?;
        let updated = self.services.update(service.id, &patch).await?;

        if let Some(driver_id) = service.driver_id {
            self.release_after_commit(driver_id, updated.id).await;
        }
        info!("service {} canceled (was {})", updated.id, service.status);
        Ok(updated)
    }

    /// The service write has already landed, so a failed release is logged
    /// and the committed service is still returned.
    async fn release_after_commit(&self, driver_id: i64, service_id: i64) {
        if let Err(e) = self.drivers.release(driver_id).await {
            warn!(
                "service {} committed but driver {} could not be released: {}",
                service_id, driver_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_summary_totals() {
        let summary = ServiceStatusSummary {
            pending: 2,
            in_progress: 1,
            completed: 4,
            canceled: 1,
        };
        assert_eq!(summary.total(), 8);
        assert_eq!(summary.active(), 3);
        assert_eq!(summary.finished(), 5);
    }
}
