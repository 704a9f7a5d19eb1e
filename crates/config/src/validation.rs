use crate::ConfigResult;

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a timeout is reasonable
    pub fn validate_timeout_seconds(timeout_seconds: u64) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(crate::ConfigError::Validation(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if timeout_seconds > 3600 {
            return Err(crate::ConfigError::Validation(
                "timeout_seconds must be less than or equal to 3600".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate that a count lies in `1..=max`
    pub fn validate_count(count: usize, field_name: &str, max: usize) -> ConfigResult<()> {
        if count == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > max {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to {max}"
            )));
        }
        Ok(())
    }

    /// Validate that a value is one of the accepted options
    pub fn validate_one_of(value: &str, field_name: &str, options: &[&str]) -> ConfigResult<()> {
        if !options.contains(&value) {
            return Err(crate::ConfigError::Validation(format!(
                "Invalid {field_name}: {value}. Valid options: {options:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(ValidationUtils::validate_not_empty("test", "field").is_ok());
        assert!(ValidationUtils::validate_not_empty("  test  ", "field").is_ok());
        assert!(ValidationUtils::validate_not_empty("", "field").is_err());
        assert!(ValidationUtils::validate_not_empty("   ", "field").is_err());
    }

    #[test]
    fn test_validate_timeout_seconds() {
        assert!(ValidationUtils::validate_timeout_seconds(30).is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(3600).is_ok());
        assert!(ValidationUtils::validate_timeout_seconds(0).is_err());
        assert!(ValidationUtils::validate_timeout_seconds(3601).is_err());
    }

    #[test]
    fn test_validate_count() {
        assert!(ValidationUtils::validate_count(3, "retries", 10).is_ok());
        assert!(ValidationUtils::validate_count(10, "retries", 10).is_ok());
        assert!(ValidationUtils::validate_count(0, "retries", 10).is_err());
        assert!(ValidationUtils::validate_count(11, "retries", 10).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(ValidationUtils::validate_one_of("json", "format", &["json", "pretty"]).is_ok());
        assert!(ValidationUtils::validate_one_of("xml", "format", &["json", "pretty"]).is_err());
    }
}
