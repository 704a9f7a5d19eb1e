pub mod models;
pub mod validation;

pub use models::{AppConfig, DatabaseConfig, DispatcherConfig, ObservabilityConfig};
pub use validation::{ConfigValidator, ValidationUtils};

/// Configuration error type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration error enumeration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests;
