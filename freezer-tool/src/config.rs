use std::path::{Path, PathBuf};

use freezer_core::{Environment, FaultConfig};
use serde::Deserialize;

use crate::error::FrzError;
use crate::store::{default_store_path, StoreType};

const ENVIRONMENT_VAR: &str = "FREEZER_ENV";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub environment: Option<Environment>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub faults: FaultConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub r#type: StoreType,
    pub path: Option<PathBuf>,
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("freezer").join("config.toml"))
}

/// Reads the config file. A missing file yields the defaults; a malformed one is an error.
pub fn load_config() -> Result<Config, FrzError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, FrzError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(err.into()),
    };
    Ok(toml::from_str(&content)?)
}

pub fn resolve_environment(config: &Config) -> Result<Environment, FrzError> {
    // Environment variable wins over the config file
    if let Ok(value) = std::env::var(ENVIRONMENT_VAR) {
        if !value.is_empty() {
            return value.parse().map_err(FrzError::Environment);
        }
    }

    Ok(config.environment.unwrap_or_default())
}

pub fn resolve_store_config(
    config: &Config,
    cli_type: Option<StoreType>,
    cli_path: Option<PathBuf>,
) -> (StoreType, PathBuf) {
    let store_type = cli_type.unwrap_or(config.store.r#type);
    let store_path = cli_path
        .or_else(|| config.store.path.clone())
        .unwrap_or_else(default_store_path);

    (store_type, store_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            environment = "production"

            [store]
            type = "memory"
            path = "/tmp/freezer"

            [faults]
            simulate = false
            failure_threshold = 3
            delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, Some(Environment::Production));
        assert_eq!(config.store.r#type, StoreType::Memory);
        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/freezer")));
        assert!(!config.faults.simulate);
        assert_eq!(config.faults.failure_threshold, 3);
        assert_eq!(config.faults.delay_ms, 250);
        assert_eq!(config.faults.test_delay_ms, FaultConfig::default().test_delay_ms);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.environment, None);
        assert_eq!(config.store.r#type, StoreType::Rocks);
        assert!(config.faults.simulate);
        assert_eq!(config.faults.failure_threshold, 1);
    }

    #[test]
    fn missing_file_is_default_and_bad_file_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert!(config.store.path.is_none());

        std::fs::write(&path, "store = 12").unwrap();
        assert!(matches!(load_config_from(&path), Err(FrzError::Config(_))));
    }

    #[test]
    fn cli_overrides_store_settings() {
        let config: Config = toml::from_str("[store]\npath = \"/from/config\"").unwrap();

        let (store_type, path) = resolve_store_config(&config, Some(StoreType::Memory), None);
        assert_eq!(store_type, StoreType::Memory);
        assert_eq!(path, PathBuf::from("/from/config"));

        let (_, path) = resolve_store_config(&config, None, Some(PathBuf::from("/from/cli")));
        assert_eq!(path, PathBuf::from("/from/cli"));
    }
}
