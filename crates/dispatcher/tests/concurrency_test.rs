#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use futures::future::join_all;
    use futures::FutureExt;

    use fleet_dispatcher::*;
    use fleet_domain::{DispatchError, DriverPool, ServiceFilter, ServiceStatus, ServiceStore};
    use fleet_infrastructure::InMemoryFleetStore;
    use fleet_testing_utils::{FleetFixture, InterleavedServiceStore};

    fn shared_engine(store: &Arc<InMemoryFleetStore>) -> Arc<DispatchEngine> {
        Arc::new(DispatchEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(NearestDriverStrategy::new()),
            // Enough rounds to outlast every driver in these fixtures.
            DispatchSettings {
                max_claim_retries: 10,
                ..DispatchSettings::default()
            },
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_driver_is_claimed_once() {
        let fixture = FleetFixture::bogota().await;
        fixture.add_driver_north(1, 2.0).await;
        let engine = shared_engine(&fixture.store);

        let requests = (0..2).map(|_| {
            let engine = engine.clone();
            let request = ServiceRequest::new(fixture.pickup.id, fixture.client.id);
            tokio::spawn(async move { engine.create(request).await })
        });
        let outcomes: Vec<DispatchOutcome> = join_all(requests)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        let assigned: Vec<_> = outcomes
            .iter()
            .filter(|o| o.service.driver_id == Some(1))
            .collect();
        assert_eq!(assigned.len(), 1);
        assert!(assigned[0].warning.is_none());

        let unassigned: Vec<_> = outcomes
            .iter()
            .filter(|o| o.service.driver_id.is_none())
            .collect();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].warning.as_deref(), Some(NO_DRIVERS_AVAILABLE));
        assert_eq!(fixture.store.available_driver_count().await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_driver_is_bound_to_two_active_services() {
        let fixture = FleetFixture::bogota().await;
        for id in 1..=5 {
            fixture.add_driver_north(id, id as f64 * 0.5).await;
        }
        let engine = shared_engine(&fixture.store);

        let requests = (0..12).map(|_| {
            let engine = engine.clone();
            let request = ServiceRequest::new(fixture.pickup.id, fixture.client.id);
            tokio::spawn(async move { engine.create(request).await })
        });
        for joined in join_all(requests).await {
            joined.unwrap().unwrap();
        }

        let services = ServiceStore::list(&*fixture.store, &ServiceFilter::default())
            .await
            .unwrap();
        assert_eq!(services.len(), 12);

        let active: Vec<_> = services
            .iter()
            .filter(|s| s.status == ServiceStatus::InProgress)
            .collect();
        assert_eq!(active.len(), 5);

        let drivers: HashSet<i64> = active.iter().filter_map(|s| s.driver_id).collect();
        assert_eq!(drivers.len(), 5);
        assert_eq!(fixture.store.available_driver_count().await, 0);
    }

    /// Drivers 1, 2 and 3 live 1, 2 and 3 km north of the pickup; the
    /// returned service is assigned to driver 1.
    async fn service_with_spare_drivers() -> (FleetFixture, i64) {
        let fixture = FleetFixture::bogota().await;
        for id in 1..=3 {
            fixture.add_driver_north(id, id as f64).await;
        }
        let outcome = shared_engine(&fixture.store)
            .create(ServiceRequest::new(fixture.pickup.id, fixture.client.id))
            .await
            .unwrap();
        assert_eq!(outcome.service.driver_id, Some(1));
        (fixture, outcome.service.id)
    }

    /// A lifecycle whose first read of `service_id` is followed by another
    /// lifecycle moving that service to driver 2.
    fn lifecycle_overtaken_by_reassign(
        store: &Arc<InMemoryFleetStore>,
        service_id: i64,
    ) -> ServiceLifecycle {
        let rival = Arc::new(ServiceLifecycle::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let services = InterleavedServiceStore::new(store.clone(), move || {
            async move {
                let moved = rival.reassign(service_id, 2).await.unwrap();
                assert_eq!(moved.driver_id, Some(2));
            }
            .boxed()
        });
        ServiceLifecycle::new(store.clone(), store.clone(), Arc::new(services))
    }

    /// Every driver is available exactly when no active service holds it.
    async fn assert_availability_matches_services(store: &InMemoryFleetStore, drivers: &[i64]) {
        let services = ServiceStore::list(store, &ServiceFilter::default())
            .await
            .unwrap();
        for &driver_id in drivers {
            let bound = services
                .iter()
                .any(|s| !s.is_finished() && s.driver_id == Some(driver_id));
            let available = DriverPool::get(store, driver_id)
                .await
                .unwrap()
                .unwrap()
                .is_available;
            assert_eq!(available, !bound, "driver {driver_id}");
        }
    }

    #[tokio::test]
    async fn test_complete_after_reassign_is_stale() {
        let (fixture, service_id) = service_with_spare_drivers().await;
        let lifecycle = lifecycle_overtaken_by_reassign(&fixture.store, service_id);

        let err = lifecycle.complete(1, service_id).await.unwrap_err();
        assert!(matches!(err, DispatchError::StaleService { .. }));

        let stored = ServiceStore::get(&*fixture.store, service_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ServiceStatus::InProgress);
        assert_eq!(stored.driver_id, Some(2));
        assert_availability_matches_services(&fixture.store, &[1, 2, 3]).await;
    }

    #[tokio::test]
    async fn test_reassign_after_reassign_is_stale_and_frees_its_driver() {
        let (fixture, service_id) = service_with_spare_drivers().await;
        let lifecycle = lifecycle_overtaken_by_reassign(&fixture.store, service_id);

        let err = lifecycle.reassign(service_id, 3).await.unwrap_err();
        assert!(matches!(err, DispatchError::StaleService { .. }));

        let stored = ServiceStore::get(&*fixture.store, service_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.driver_id, Some(2));
        assert_availability_matches_services(&fixture.store, &[1, 2, 3]).await;
        assert_eq!(fixture.store.available_driver_count().await, 2);
    }

    #[tokio::test]
    async fn test_cancel_after_reassign_is_stale() {
        let (fixture, service_id) = service_with_spare_drivers().await;
        let lifecycle = lifecycle_overtaken_by_reassign(&fixture.store, service_id);

        let err = lifecycle.cancel(service_id).await.unwrap_err();
        assert!(matches!(err, DispatchError::StaleService { .. }));

        let stored = ServiceStore::get(&*fixture.store, service_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ServiceStatus::InProgress);
        assert_eq!(stored.driver_id, Some(2));
        assert_availability_matches_services(&fixture.store, &[1, 2, 3]).await;
    }
}
