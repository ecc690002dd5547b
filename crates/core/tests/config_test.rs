use std::env;
use std::fs;
use std::sync::Mutex;

use extraction_core::{AppConfig, DispatchStrategyKind};
use tempfile::Builder;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_env_overrides_file_values() {
    let _guard = ENV_MUTEX.lock().unwrap();

    let file = Builder::new().suffix(".toml").tempfile().unwrap();
    fs::write(
        file.path(),
        r#"
        [coordinator]
        default_max_retries = 2
        dispatch_strategy = "least_utilized"
        "#,
    )
    .unwrap();

    env::set_var("EXTRACTION_COORDINATOR__DEFAULT_MAX_RETRIES", "7");
    env::set_var("EXTRACTION_COORDINATOR__DISPATCH_STRATEGY", "adaptive");

    let config = AppConfig::load(file.path().to_str());

    env::remove_var("EXTRACTION_COORDINATOR__DEFAULT_MAX_RETRIES");
    env::remove_var("EXTRACTION_COORDINATOR__DISPATCH_STRATEGY");

    let config = config.unwrap();
    assert_eq!(config.coordinator.default_max_retries, 7);
    assert_eq!(
        config.coordinator.dispatch_strategy,
        DispatchStrategyKind::Adaptive
    );
}

#[test]
fn test_invalid_env_value_fails_validation() {
    let _guard = ENV_MUTEX.lock().unwrap();

    env::set_var("EXTRACTION_OBSERVABILITY__LOG_LEVEL", "verbose");
    let result = AppConfig::load(None);
    env::remove_var("EXTRACTION_OBSERVABILITY__LOG_LEVEL");

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("verbose"));
}

#[test]
fn test_shipped_config_file_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/extraction.toml");
    let config = AppConfig::from_toml(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(config, AppConfig::default());
}
