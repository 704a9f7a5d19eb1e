//! Test data builders with sensible defaults.

use chrono::Utc;
use fleet_domain::{Address, Client, Coordinates, Driver, Service, ServiceStatus};

/// Builder for test addresses. Defaults to central Bogotá.
pub struct AddressBuilder {
    address: Address,
}

impl AddressBuilder {
    pub fn new() -> Self {
        Self {
            address: Address {
                id: 1,
                name: "Plaza de Bolívar".to_string(),
                country: "Colombia".to_string(),
                city: "Bogotá".to_string(),
                street: Some("Carrera 7".to_string()),
                coordinates: Coordinates::new(4.60971, -74.08175).ok(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.address.id = id;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.address.name = name.to_string();
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.address.city = city.to_string();
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.address.country = country.to_string();
        self
    }

    /// Panics on out-of-range values; test input only.
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.address.coordinates =
            Some(Coordinates::new(latitude, longitude).expect("valid test coordinates"));
        self
    }

    pub fn without_coordinates(mut self) -> Self {
        self.address.coordinates = None;
        self
    }

    pub fn build(self) -> Address {
        self.address
    }
}

impl Default for AddressBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ClientBuilder {
    client: Client,
}

impl ClientBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            client: Client {
                id: 1,
                name: "Laura Gómez".to_string(),
                phone: "3101112233".to_string(),
                email: Some("laura@example.com".to_string()),
                address_id: 1,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.client.id = id;
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.client.phone = phone.to_string();
        self
    }

    pub fn with_address(mut self, address_id: i64) -> Self {
        self.client.address_id = address_id;
        self
    }

    pub fn build(self) -> Client {
        self.client
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DriverBuilder {
    driver: Driver,
}

impl DriverBuilder {
    pub fn new() -> Self {
        Self {
            driver: Driver {
                id: 1,
                name: "Carlos Ramírez".to_string(),
                phone: "3201112233".to_string(),
                address_id: 1,
                is_available: true,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.driver.id = id;
        self.driver.phone = format!("320{id:07}");
        self
    }

    pub fn with_home(mut self, address_id: i64) -> Self {
        self.driver.address_id = address_id;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.driver.is_available = false;
        self
    }

    pub fn build(self) -> Driver {
        self.driver
    }
}

impl Default for DriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for already persisted services, for fixtures that start mid-lifecycle.
pub struct ServiceBuilder {
    service: Service,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            service: Service {
                id: 1,
                pickup_address_id: 1,
                client_id: 1,
                driver_id: None,
                status: ServiceStatus::Pending,
                estimated_time: None,
                distance: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.service.id = id;
        self
    }

    pub fn with_pickup(mut self, address_id: i64) -> Self {
        self.service.pickup_address_id = address_id;
        self
    }

    pub fn with_client(mut self, client_id: i64) -> Self {
        self.service.client_id = client_id;
        self
    }

    /// Assigns the driver and moves the service to `in_progress`.
    pub fn assigned_to(mut self, driver_id: i64) -> Self {
        self.service.driver_id = Some(driver_id);
        self.service.status = ServiceStatus::InProgress;
        self
    }

    pub fn with_status(mut self, status: ServiceStatus) -> Self {
        self.service.status = status;
        self
    }

    pub fn build(self) -> Service {
        self.service
    }
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
