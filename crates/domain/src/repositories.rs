//! Ports consumed by the dispatch core.
//!
//! The core only reads addresses and clients, claims and releases drivers,
//! and persists services. Everything else about these records (CRUD,
//! uniqueness, contact validation) belongs to the surrounding application.

use async_trait::async_trait;
use fleet_errors::DispatchResult;

use crate::entities::{
    Address, Client, Driver, DriverCandidate, NewService, Service, ServiceFilter, ServicePatch,
};

/// Read-only address lookup.
#[async_trait]
pub trait AddressDirectory: Send + Sync {
    async fn get(&self, id: i64) -> DispatchResult<Option<Address>>;
}

/// Read-only client lookup.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn get(&self, id: i64) -> DispatchResult<Option<Client>>;
}

/// Driver store whose availability flag is owned by the core.
///
/// `claim` and `release` are the only operations allowed to change
/// `is_available`.
#[async_trait]
pub trait DriverPool: Send + Sync {
    async fn get(&self, id: i64) -> DispatchResult<Option<Driver>>;

    /// Available drivers whose home address is in `city` (and `country` when
    /// given), compared case-insensitively, ordered by ascending driver id.
    async fn list_available_in_city(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> DispatchResult<Vec<DriverCandidate>>;

    /// Conditional write: marks the driver unavailable only if it is currently
    /// available. Returns `false` when the driver is already taken or unknown.
    async fn claim(&self, id: i64) -> DispatchResult<bool>;

    /// Marks the driver available. Idempotent.
    async fn release(&self, id: i64) -> DispatchResult<()>;
}

#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn create(&self, record: &NewService) -> DispatchResult<Service>;

    async fn get(&self, id: i64) -> DispatchResult<Option<Service>>;

    /// Applies `patch` and bumps `updated_at`. Fails with `ServiceNotFound`
    /// for unknown ids and with `StaleService` when `patch.expected_status`
    /// does not match the stored status.
    async fn update(&self, id: i64, patch: &ServicePatch) -> DispatchResult<Service>;

    /// Newest first.
    async fn list(&self, filter: &ServiceFilter) -> DispatchResult<Vec<Service>>;
}
