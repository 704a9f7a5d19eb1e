use fleet::Application;
use fleet_config::{AppConfig, DatabaseConfig};
use fleet_dispatcher::{ServiceRequest, NO_DRIVERS_AVAILABLE};
use fleet_domain::{DriverPool, ServiceFilter, ServiceStatus};
use fleet_infrastructure::{
    SeedPlan, SqliteAddressDirectory, SqliteClientDirectory, SqliteDriverPool,
};
use fleet_testing_utils::{
    offset_north_km, AddressBuilder, ClientBuilder, DriverBuilder, BOGOTA_PICKUP,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

async fn memory_app() -> Application {
    let config = AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            connection_timeout_seconds: 5,
            idle_timeout_seconds: 600,
        },
        ..AppConfig::default()
    };
    Application::new(config).await.unwrap()
}

/// Pickup address 1 with client 1, plus drivers 1 (9 km) and 2 (2 km) in Bogotá.
async fn seed_bogota(app: &Application) -> SqliteDriverPool {
    let pool = app.database().pool().clone();
    let addresses = SqliteAddressDirectory::new(pool.clone());
    let clients = SqliteClientDirectory::new(pool.clone());
    let drivers = SqliteDriverPool::new(pool);

    addresses
        .insert(
            &AddressBuilder::new()
                .with_id(1)
                .with_coordinates(BOGOTA_PICKUP.0, BOGOTA_PICKUP.1)
                .build(),
        )
        .await
        .unwrap();
    clients
        .insert(&ClientBuilder::new().with_id(1).with_address(1).build())
        .await
        .unwrap();

    for (driver_id, km) in [(1, 9.0), (2, 2.0)] {
        let (lat, lon) = offset_north_km(BOGOTA_PICKUP, km);
        let home = addresses
            .insert(
                &AddressBuilder::new()
                    .with_id(100 + driver_id)
                    .with_coordinates(lat, lon)
                    .build(),
            )
            .await
            .unwrap();
        drivers
            .insert(&DriverBuilder::new().with_id(driver_id).with_home(home.id).build())
            .await
            .unwrap();
    }
    drivers
}

#[tokio::test]
async fn test_request_complete_round_trip_on_sqlite() {
    let app = memory_app().await;
    let drivers = seed_bogota(&app).await;

    let outcome = app.engine().create(ServiceRequest::new(1, 1)).await.unwrap();
    assert!(outcome.warning.is_none());
    assert_eq!(outcome.service.driver_id, Some(2));
    assert_eq!(outcome.service.status, ServiceStatus::InProgress);
    assert!((outcome.service.estimated_time.unwrap() - 3.0).abs() < 1e-2);
    assert!(!DriverPool::get(&drivers, 2).await.unwrap().unwrap().is_available);

    let err = app
        .lifecycle()
        .complete(1, outcome.service.id)
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    let completed = app
        .lifecycle()
        .complete(2, outcome.service.id)
        .await
        .unwrap();
    assert_eq!(completed.status, ServiceStatus::Completed);
    assert!(DriverPool::get(&drivers, 2).await.unwrap().unwrap().is_available);

    let summary = app.lifecycle().status_summary().await.unwrap();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.total(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_reassign_and_cancel_on_sqlite() {
    let app = memory_app().await;
    let drivers = seed_bogota(&app).await;

    let service = app
        .engine()
        .create(ServiceRequest::new(1, 1))
        .await
        .unwrap()
        .service;

    let moved = app.lifecycle().reassign(service.id, 1).await.unwrap();
    assert_eq!(moved.driver_id, Some(1));
    assert!((moved.distance.unwrap() - 9.0).abs() < 1e-3);
    assert!(DriverPool::get(&drivers, 2).await.unwrap().unwrap().is_available);

    let canceled = app.lifecycle().cancel(service.id).await.unwrap();
    assert_eq!(canceled.status, ServiceStatus::Canceled);
    assert!(DriverPool::get(&drivers, 1).await.unwrap().unwrap().is_available);

    let err = app.lifecycle().reassign(service.id, 2).await.unwrap_err();
    assert!(err.is_conflict());

    app.shutdown().await;
}

#[tokio::test]
async fn test_exhausted_pool_returns_warning_on_sqlite() {
    let app = memory_app().await;
    seed_bogota(&app).await;

    for _ in 0..2 {
        let outcome = app.engine().create(ServiceRequest::new(1, 1)).await.unwrap();
        assert!(outcome.service.driver_id.is_some());
    }

    let outcome = app.engine().create(ServiceRequest::new(1, 1)).await.unwrap();
    assert_eq!(outcome.warning.as_deref(), Some(NO_DRIVERS_AVAILABLE));
    assert_eq!(outcome.service.status, ServiceStatus::Pending);

    let pending = app
        .lifecycle()
        .list(&ServiceFilter::with_status(ServiceStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_seeded_database_is_dispatchable() {
    let app = memory_app().await;
    let mut rng = StdRng::seed_from_u64(42);
    let report = app
        .seed(
            SeedPlan {
                clients: 10,
                drivers: 10,
            },
            &mut rng,
        )
        .await
        .unwrap();
    assert_eq!(report.services, 10);

    // Every seeded client got a pending service on its own address.
    let pending = app
        .lifecycle()
        .list(&ServiceFilter::with_status(ServiceStatus::Pending))
        .await
        .unwrap();
    let first = pending.last().unwrap();

    let outcome = app
        .engine()
        .create(ServiceRequest::new(first.pickup_address_id, first.client_id))
        .await
        .unwrap();
    match outcome.service.driver_id {
        Some(_) => assert!(outcome.service.distance.unwrap() >= 0.0),
        None => assert_eq!(outcome.warning.as_deref(), Some(NO_DRIVERS_AVAILABLE)),
    }

    let route = app
        .engine()
        .distance_between(first.pickup_address_id, first.pickup_address_id)
        .await
        .unwrap();
    assert_eq!(route.distance_km, 0.0);

    app.shutdown().await;
}
