use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_config::AppConfig;
use fleet_dispatcher::{strategy_from_name, DispatchEngine, DispatchSettings, ServiceLifecycle};
use fleet_infrastructure::{
    DatabaseManager, DemoSeeder, SeedPlan, SeedReport, SqliteAddressDirectory,
    SqliteClientDirectory, SqliteDriverPool, SqliteServiceStore,
};
use rand::Rng;
use tracing::info;

/// Wires the SQLite adapters into the dispatch engine and the service
/// lifecycle according to `AppConfig`.
pub struct Application {
    config: AppConfig,
    database: DatabaseManager,
    engine: DispatchEngine,
    lifecycle: ServiceLifecycle,
}

impl Application {
    /// Connects to the configured database and makes sure the schema exists.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let database = DatabaseManager::new(&config.database).await?;
        database.migrate().await?;

        let pool = database.pool().clone();
        let addresses = Arc::new(SqliteAddressDirectory::new(pool.clone()));
        let clients = Arc::new(SqliteClientDirectory::new(pool.clone()));
        let drivers = Arc::new(SqliteDriverPool::new(pool.clone()));
        let services = Arc::new(SqliteServiceStore::new(pool));

        let strategy = strategy_from_name(&config.dispatcher.strategy)
            .context("failed to build dispatch strategy")?;
        let settings = DispatchSettings::from(&config.dispatcher);
        info!(
            "dispatch engine ready: strategy={}, location_policy={}, max_claim_retries={}",
            strategy.name(),
            settings.location_policy,
            settings.max_claim_retries
        );

        let engine = DispatchEngine::new(
            addresses.clone(),
            clients,
            drivers.clone(),
            services.clone(),
            strategy,
            settings,
        );
        let lifecycle = ServiceLifecycle::new(addresses, drivers, services);

        Ok(Self {
            config,
            database,
            engine,
            lifecycle,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.database
    }

    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn lifecycle(&self) -> &ServiceLifecycle {
        &self.lifecycle
    }

    pub async fn seed<R: Rng>(&self, plan: SeedPlan, rng: &mut R) -> Result<SeedReport> {
        DemoSeeder::new(&self.database)
            .seed(plan, rng)
            .await
            .context("failed to seed demo data")
    }

    pub async fn shutdown(&self) {
        self.database.close().await;
        info!("database connections closed");
    }
}
