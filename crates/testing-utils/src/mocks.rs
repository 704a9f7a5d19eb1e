//! Test doubles for the dispatch ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use fleet_domain::{Driver, DriverCandidate, DriverPool, NewService, Service, ServiceFilter, ServicePatch, ServiceStore};
use fleet_errors::{DispatchError, DispatchResult};

/// Simulates competing dispatchers: the first `losses` claims are won by
/// "someone else" (the inner driver is claimed, but `false` is returned).
pub struct ContendedDriverPool {
    inner: Arc<dyn DriverPool>,
    losses: AtomicUsize,
    attempts: AtomicUsize,
}

impl ContendedDriverPool {
    pub fn new(inner: Arc<dyn DriverPool>, losses: usize) -> Self {
        Self {
            inner,
            losses: AtomicUsize::new(losses),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn claim_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DriverPool for ContendedDriverPool {
    async fn get(&self, id: i64) -> DispatchResult<Option<Driver>> {
        self.inner.get(id).await
    }

    async fn list_available_in_city(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> DispatchResult<Vec<DriverCandidate>> {
        self.inner.list_available_in_city(city, country).await
    }

    async fn claim(&self, id: i64) -> DispatchResult<bool> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let lose = self
            .losses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if lose {
            self.inner.claim(id).await?;
            return Ok(false);
        }
        self.inner.claim(id).await
    }

    async fn release(&self, id: i64) -> DispatchResult<()> {
        self.inner.release(id).await
    }
}

/// Service store whose writes always fail; reads go to `inner`.
pub struct FailingServiceStore {
    inner: Arc<dyn ServiceStore>,
}

impl FailingServiceStore {
    pub fn new(inner: Arc<dyn ServiceStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ServiceStore for FailingServiceStore {
    async fn create(&self, _record: &NewService) -> DispatchResult<Service> {
        Err(DispatchError::database_error("disk I/O error"))
    }

    async fn get(&self, id: i64) -> DispatchResult<Option<Service>> {
        self.inner.get(id).await
    }

    async fn update(&self, _id: i64, _patch: &ServicePatch) -> DispatchResult<Service> {
        Err(DispatchError::database_error("disk I/O error"))
    }

    async fn list(&self, filter: &ServiceFilter) -> DispatchResult<Vec<Service>> {
        self.inner.list(filter).await
    }
}

/// Driver pool whose `release` always fails; everything else goes to `inner`.
pub struct UnreleasableDriverPool {
    inner: Arc<dyn DriverPool>,
}

impl UnreleasableDriverPool {
    pub fn new(inner: Arc<dyn DriverPool>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DriverPool for UnreleasableDriverPool {
    async fn get(&self, id: i64) -> DispatchResult<Option<Driver>> {
        self.inner.get(id).await
    }

    async fn list_available_in_city(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> DispatchResult<Vec<DriverCandidate>> {
        self.inner.list_available_in_city(city, country).await
    }

    async fn claim(&self, id: i64) -> DispatchResult<bool> {
        self.inner.claim(id).await
    }

    async fn release(&self, _id: i64) -> DispatchResult<()> {
        Err(DispatchError::database_error("database is locked"))
    }
}

type Interleaving = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Service store that lets another operation slip in between a read and the
/// write that follows it.
///
/// The first `get` reads the record from `inner`, then runs `interleaving`
/// to completion, and only then hands back the record it read. Later calls
/// go straight to `inner`.
pub struct InterleavedServiceStore {
    inner: Arc<dyn ServiceStore>,
    interleaving: Mutex<Option<Interleaving>>,
}

impl InterleavedServiceStore {
    pub fn new<F>(inner: Arc<dyn ServiceStore>, interleaving: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, ()> + Send + 'static,
    {
        Self {
            inner,
            interleaving: Mutex::new(Some(Box::new(interleaving))),
        }
    }
}

#[async_trait]
impl ServiceStore for InterleavedServiceStore {
    async fn create(&self, record: &NewService) -> DispatchResult<Service> {
        self.inner.create(record).await
    }

    async fn get(&self, id: i64) -> DispatchResult<Option<Service>> {
        let snapshot = self.inner.get(id).await?;
        let pending = self
            .interleaving
            .lock()
            .map_err(|_| DispatchError::Internal("interleaving lock poisoned".to_string()))?
            .take();
        if let Some(run) = pending {
            run().await;
        }
        Ok(snapshot)
    }

    async fn update(&self, id: i64, patch: &ServicePatch) -> DispatchResult<Service> {
        self.inner.update(id, patch).await
    }

    async fn list(&self, filter: &ServiceFilter) -> DispatchResult<Vec<Service>> {
        self.inner.list(filter).await
    }
}
