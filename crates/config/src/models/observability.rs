use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const LOG_FORMATS: [&str; 2] = ["json", "pretty"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ConfigValidator for ObservabilityConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.log_level, "observability.log_level")?;
        ValidationUtils::validate_one_of(&self.log_level, "observability.log_level", &LOG_LEVELS)?;
        ValidationUtils::validate_one_of(
            &self.log_format,
            "observability.log_format",
            &LOG_FORMATS,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observability_config_validation() {
        let config = ObservabilityConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.log_level = "verbose".to_string();
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.log_format = "xml".to_string();
        assert!(invalid_config.validate().is_err());
    }
}
