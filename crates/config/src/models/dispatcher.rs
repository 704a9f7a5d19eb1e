use crate::validation::{ConfigValidator, ValidationUtils};
use fleet_domain::LocationPolicy;
use serde::{Deserialize, Serialize};

pub const DISPATCH_STRATEGIES: [&str; 1] = ["nearest"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Extra selection rounds after a lost claim race.
    pub max_claim_retries: usize,
    pub location_policy: LocationPolicy,
    pub strategy: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_claim_retries: 3,
            location_policy: LocationPolicy::CityAndCountry,
            strategy: "nearest".to_string(),
        }
    }
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_count(
            self.max_claim_retries,
            "dispatcher.max_claim_retries",
            10,
        )?;
        ValidationUtils::validate_not_empty(&self.strategy, "dispatcher.strategy")?;
        ValidationUtils::validate_one_of(
            &self.strategy,
            "dispatcher.strategy",
            &DISPATCH_STRATEGIES,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatcher_config_validation() {
        let config = DispatcherConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid_config = config.clone();
        invalid_config.max_claim_retries = 0;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.max_claim_retries = 50;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = config.clone();
        invalid_config.strategy = "round_robin".to_string();
        assert!(invalid_config.validate().is_err());
    }
}
