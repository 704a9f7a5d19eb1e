use crate::AppConfig;
use fleet_domain::LocationPolicy;

use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_missing_explicit_file_fails() {
    let result = AppConfig::load(Some("/definitely/not/here/fleet.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_partial_file_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[dispatcher]
location_policy = "city_only"
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let config = AppConfig::load(Some(&path)).unwrap();

    assert_eq!(config.dispatcher.location_policy, LocationPolicy::CityOnly);
    assert_eq!(config.dispatcher.max_claim_retries, 3);
    assert_eq!(config.dispatcher.strategy, "nearest");
    assert_eq!(config.observability.log_level, "info");
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[observability]
log_level = "loud"
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    assert!(AppConfig::load(Some(&path)).is_err());
}
