//! Registry configuration.
//!
//! Loaded from YAML, then overridden by environment variables:
//!
//! - `SBT_BURN_TIMELOCK_SECS`: burn timelock in seconds (default: 259200)
//! - `SBT_TRANSFER_MODE`: `true`/`false`, initial transfer switch (default: false)
//!
//! ```yaml
//! burn_timelock_secs: 3600
//! transfer_mode: false
//! administrators:
//!   - "0x00000000000000000000000000000000000000ad"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sbt_core::Principal;

use crate::burn::DEFAULT_BURN_TIMELOCK_SECS;

/// Environment variable overriding [`RegistryConfig::burn_timelock_secs`].
pub const ENV_BURN_TIMELOCK_SECS: &str = "SBT_BURN_TIMELOCK_SECS";

/// Environment variable overriding [`RegistryConfig::transfer_mode`].
pub const ENV_TRANSFER_MODE: &str = "SBT_TRANSFER_MODE";

/// Genesis settings for a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Seconds after a burn request before it clears without approval.
    pub burn_timelock_secs: u64,
    /// Initial value of the global transfer switch.
    pub transfer_mode: bool,
    /// Principals seeded with the administrator role.
    pub administrators: Vec<Principal>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            burn_timelock_secs: DEFAULT_BURN_TIMELOCK_SECS,
            transfer_mode: false,
            administrators: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Parse YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a YAML file, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SBT_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup.
    pub fn apply_overrides_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_BURN_TIMELOCK_SECS) {
            self.burn_timelock_secs =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidOverride {
                        key: ENV_BURN_TIMELOCK_SECS,
                        value: raw.clone(),
                        reason: e.to_string(),
                    })?;
        }
        if let Some(raw) = lookup(ENV_TRANSFER_MODE) {
            self.transfer_mode = parse_bool(&raw).ok_or_else(|| ConfigError::InvalidOverride {
                key: ENV_TRANSFER_MODE,
                value: raw.clone(),
                reason: "expected true or false".to_string(),
            })?;
        }
        Ok(())
    }

    /// Check the configuration can govern a registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.administrators.is_empty() {
            return Err(ConfigError::NoAdministrators);
        }
        if self.administrators.iter().any(Principal::is_null) {
            return Err(ConfigError::NullAdministrator);
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidOverride {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("at least one administrator must be configured")]
    NoAdministrators,
    #[error("the null address cannot be an administrator")]
    NullAdministrator,
}
