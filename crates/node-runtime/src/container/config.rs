//! # Node Configuration
//!
//! One struct holding every subsystem's settings. Values come from, in
//! order of precedence:
//!
//! 1. `MODSYNC_*` environment variables
//! 2. The JSON file named by `MODSYNC_CONFIG`
//! 3. Defaults

use std::path::Path;

use anyhow::{Context, Result};
use ms_01_synchronization::SyncConfig;
use ms_02_mute_cache::{CacheVariant, MuteCacheConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Path of an optional JSON config file.
pub const CONFIG_FILE_VAR: &str = "MODSYNC_CONFIG";
pub const POLL_INTERVAL_VAR: &str = "MODSYNC_POLL_INTERVAL_MS";
pub const MUTE_EXPIRATION_VAR: &str = "MODSYNC_MUTE_EXPIRATION_MS";
pub const PURGE_INTERVAL_VAR: &str = "MODSYNC_PURGE_INTERVAL_MS";
pub const GRACE_PERIOD_VAR: &str = "MODSYNC_GRACE_PERIOD_MS";
/// `always-available` or `on-demand`.
pub const MUTE_CACHE_VAR: &str = "MODSYNC_MUTE_CACHE";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub sync: SyncConfig,
    pub mute_cache: MuteCacheConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid synchronization config: {0}")]
    Sync(#[from] ms_01_synchronization::ConfigError),

    #[error("Invalid mute cache config: {0}")]
    MuteCache(#[from] ms_02_mute_cache::ConfigError),

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync.validate()?;
        self.mute_cache.validate()?;
        Ok(())
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Apply `MODSYNC_*` overrides found through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_millis(&lookup, POLL_INTERVAL_VAR)? {
            self.sync.poll_interval_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, MUTE_EXPIRATION_VAR)? {
            self.mute_cache.expiration_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, PURGE_INTERVAL_VAR)? {
            self.mute_cache.purge_interval_ms = ms;
        }
        if let Some(ms) = parse_millis(&lookup, GRACE_PERIOD_VAR)? {
            self.mute_cache.grace_period_ms = ms;
        }
        if let Some(value) = lookup(MUTE_CACHE_VAR) {
            let variant = match value.trim() {
                "always-available" => Some(CacheVariant::AlwaysAvailable),
                "on-demand" => Some(CacheVariant::OnDemand),
                _ => None,
            };
            self.mute_cache.variant = variant.ok_or(ConfigError::InvalidEnv {
                var: MUTE_CACHE_VAR,
                value,
            })?;
        }
        Ok(())
    }
}

fn parse_millis<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}

/// Load configuration from the process environment and files.
pub fn load_config() -> Result<NodeConfig> {
    let mut config = match std::env::var(CONFIG_FILE_VAR) {
        Ok(path) => {
            info!(path = %path, "Loading configuration file");
            NodeConfig::from_json_file(Path::new(&path))?
        }
        Err(_) => NodeConfig::default(),
    };
    config.apply_overrides(|var| std::env::var(var).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(NodeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = NodeConfig::default();
        config
            .apply_overrides(env(&[
                (POLL_INTERVAL_VAR, "250"),
                (MUTE_EXPIRATION_VAR, "30000"),
                (PURGE_INTERVAL_VAR, "5000"),
                (GRACE_PERIOD_VAR, "120000"),
                (MUTE_CACHE_VAR, "on-demand"),
            ]))
            .unwrap();

        assert_eq!(config.sync.poll_interval_ms, 250);
        assert_eq!(config.mute_cache.expiration_ms, 30_000);
        assert_eq!(config.mute_cache.purge_interval_ms, 5_000);
        assert_eq!(config.mute_cache.grace_period_ms, 120_000);
        assert_eq!(config.mute_cache.variant, CacheVariant::OnDemand);
    }

    #[test]
    fn test_bad_env_values_are_rejected() {
        let mut config = NodeConfig::default();
        let err = config
            .apply_overrides(env(&[(POLL_INTERVAL_VAR, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: POLL_INTERVAL_VAR, .. }));

        let err = config
            .apply_overrides(env(&[(MUTE_CACHE_VAR, "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: MUTE_CACHE_VAR, .. }));
    }

    #[test]
    fn test_validation_reaches_subsystems() {
        let mut config = NodeConfig::default();
        config.sync.poll_interval_ms = 1;
        assert!(matches!(config.validate(), Err(ConfigError::Sync(_))));

        let mut config = NodeConfig::default();
        config.mute_cache.expiration_ms = 1;
        assert!(matches!(config.validate(), Err(ConfigError::MuteCache(_))));
    }

    #[test]
    fn test_json_file_keeps_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"sync":{"poll_interval_ms":1500}}"#).unwrap();

        let config = NodeConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.sync.poll_interval_ms, 1_500);
        assert_eq!(config.mute_cache, MuteCacheConfig::default());
    }
}
