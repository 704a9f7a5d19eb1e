//! Demo data for local runs: Colombian addresses, clients that each have a
//! pending service, and drivers with random availability.

use chrono::Utc;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use fleet_domain::{Address, Client, Coordinates, Driver, NewService, ServiceStore};
use fleet_errors::DispatchResult;

use crate::database::sqlite::{
    SqliteAddressDirectory, SqliteClientDirectory, SqliteDriverPool, SqliteServiceStore,
};
use crate::database::DatabaseManager;

const CITIES: [(&str, f64, f64); 6] = [
    ("Bogotá", 4.60971, -74.08175),
    ("Medellín", 6.25184, -75.56359),
    ("Cali", 3.43722, -76.5225),
    ("Barranquilla", 10.96854, -74.78132),
    ("Cartagena", 10.39972, -75.51444),
    ("Bucaramanga", 7.12539, -73.1198),
];

const FIRST_NAMES: [&str; 10] = [
    "Andrés", "Camila", "Juan", "Valentina", "Santiago", "Mariana", "Felipe", "Daniela",
    "Carlos", "Laura",
];

const LAST_NAMES: [&str; 10] = [
    "Gómez", "Rodríguez", "Martínez", "López", "García", "Hernández", "Ramírez", "Torres",
    "Moreno", "Vargas",
];

const STREETS: [&str; 6] = [
    "Calle", "Carrera", "Avenida", "Diagonal", "Transversal", "Avenida Calle",
];

/// Maximum offset from the city centre, in degrees (about 5.5 km).
const JITTER_DEGREES: f64 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct SeedPlan {
    pub clients: usize,
    pub drivers: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            clients: 50,
            drivers: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SeedReport {
    pub addresses: usize,
    pub clients: usize,
    pub services: usize,
    pub drivers: usize,
    pub available_drivers: usize,
}

pub struct DemoSeeder {
    addresses: SqliteAddressDirectory,
    clients: SqliteClientDirectory,
    drivers: SqliteDriverPool,
    services: SqliteServiceStore,
}

impl DemoSeeder {
    pub fn new(db: &DatabaseManager) -> Self {
        let pool = db.pool().clone();
        Self {
            addresses: SqliteAddressDirectory::new(pool.clone()),
            clients: SqliteClientDirectory::new(pool.clone()),
            drivers: SqliteDriverPool::new(pool.clone()),
            services: SqliteServiceStore::new(pool),
        }
    }

    pub async fn seed<R: Rng>(&self, plan: SeedPlan, rng: &mut R) -> DispatchResult<SeedReport> {
        let mut report = SeedReport::default();
        // Phone numbers are unique per table, so every record gets its own suffix.
        let run = Utc::now().timestamp_millis() % 1_000_000;

        for n in 0..plan.clients {
            let address = self.addresses.insert(&random_address(rng)?).await?;
            report.addresses += 1;

            let name = random_name(rng);
            let now = Utc::now();
            let client = self
                .clients
                .insert(&Client {
                    id: 0,
                    email: Some(format!(
                        "{}.{run}.{n}@example.com",
                        name.to_lowercase().replace(' ', ".")
                    )),
                    name,
                    phone: format!("31{run:06}{n:03}"),
                    address_id: address.id,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            report.clients += 1;

            self.services
                .create(&NewService::pending(address.id, client.id))
                .await?;
            report.services += 1;
        }

        for n in 0..plan.drivers {
            let address = self.addresses.insert(&random_address(rng)?).await?;
            report.addresses += 1;

            let driver = self
                .drivers
                .insert(&Driver {
                    id: 0,
                    name: random_name(rng),
                    phone: format!("32{run:06}{n:03}"),
                    address_id: address.id,
                    is_available: rng.random_bool(0.5),
                })
                .await?;
            report.drivers += 1;
            if driver.is_available {
                report.available_drivers += 1;
            }
        }

        info!(
            "seeded {} clients, {} services and {} drivers ({} available)",
            report.clients, report.services, report.drivers, report.available_drivers
        );
        Ok(report)
    }
}

fn random_name<R: Rng>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Ana");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Pérez");
    format!("{first} {last}")
}

fn random_address<R: Rng>(rng: &mut R) -> DispatchResult<Address> {
    let (city, lat, lon) = CITIES.choose(rng).copied().unwrap_or(CITIES[0]);
    let street = STREETS.choose(rng).copied().unwrap_or("Calle");
    let coordinates = Coordinates::new(
        lat + rng.random_range(-JITTER_DEGREES..JITTER_DEGREES),
        lon + rng.random_range(-JITTER_DEGREES..JITTER_DEGREES),
    )?;

    let street = format!("{street} {}", rng.random_range(1..150));
    let name = format!(
        "{street} #{}-{}",
        rng.random_range(1..99),
        rng.random_range(1..99)
    );

    Ok(Address {
        id: 0,
        name,
        country: "Colombia".to_string(),
        city: city.to_string(),
        street: Some(street),
        coordinates: Some(coordinates),
    })
}
