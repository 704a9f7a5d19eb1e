use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    database::DatabaseConfig, dispatcher::DispatcherConfig, observability::ObservabilityConfig,
};
use crate::validation::ConfigValidator;

pub const DEFAULT_CONFIG_PATHS: [&str; 3] = ["config/fleet.toml", "fleet.toml", "/etc/fleet/config.toml"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dispatcher: DispatcherConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Defaults, then the TOML file, then `FLEET_SECTION__KEY` environment overrides.
    ///
    /// An explicit path must exist; without one the first of
    /// [`DEFAULT_CONFIG_PATHS`] that exists is used, if any.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("database.url", defaults.database.url.as_str())?
            .set_default("database.max_connections", defaults.database.max_connections as i64)?
            .set_default("database.min_connections", defaults.database.min_connections as i64)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds as i64,
            )?
            .set_default(
                "database.idle_timeout_seconds",
                defaults.database.idle_timeout_seconds as i64,
            )?
            .set_default(
                "dispatcher.max_claim_retries",
                defaults.dispatcher.max_claim_retries as i64,
            )?
            .set_default(
                "dispatcher.location_policy",
                defaults.dispatcher.location_policy.as_str(),
            )?
            .set_default("dispatcher.strategy", defaults.dispatcher.strategy.as_str())?
            .set_default("observability.log_level", defaults.observability.log_level.as_str())?
            .set_default(
                "observability.log_format",
                defaults.observability.log_format.as_str(),
            )?;

        match config_path {
            Some(path) => {
                if !Path::new(path).exists() {
                    return Err(anyhow::anyhow!("config file does not exist: {}", path));
                }
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
            None => {
                if let Some(path) = DEFAULT_CONFIG_PATHS
                    .iter()
                    .find(|path| Path::new(path).exists())
                {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FLEET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration to TOML")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.database.validate()?;
        self.dispatcher.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::LocationPolicy;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.dispatcher.max_claim_retries, 3);
        assert_eq!(
            config.dispatcher.location_policy,
            LocationPolicy::CityAndCountry
        );
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_app_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_app_config_from_toml() {
        let toml_str = r#"
[database]
url = "sqlite::memory:"
max_connections = 1
min_connections = 1
connection_timeout_seconds = 30
idle_timeout_seconds = 600

[dispatcher]
max_claim_retries = 5
location_policy = "city_only"
strategy = "nearest"

[observability]
log_level = "debug"
log_format = "json"
"#;

        let config = AppConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.dispatcher.max_claim_retries, 5);
        assert_eq!(config.dispatcher.location_policy, LocationPolicy::CityOnly);
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_app_config_from_invalid_toml() {
        let toml_str = r#"
[database]
url = "sqlite::memory:"
max_connections = 1
min_connections = 1
connection_timeout_seconds = 30
idle_timeout_seconds = 600

[dispatcher]
max_claim_retries = 0
location_policy = "city_only"
strategy = "nearest"

[observability]
log_level = "debug"
log_format = "json"
"#;
        assert!(AppConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_app_config_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("location_policy = \"city_and_country\""));

        let parsed = AppConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.database.url, config.database.url);
    }
}
