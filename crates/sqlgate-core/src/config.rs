//! Configuration management for SqlGate.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Values here are raw operator input;
//! the policy and filter crates validate them when building their
//! immutable snapshots, failing fast on malformed entries.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main broker configuration.
///
/// This is loaded from `~/.config/sqlgate/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Network-destination and credential policy settings
    pub policy: PolicyConfig,
    /// Session and secret lifetime settings
    pub session: SessionConfig,
}

impl GateConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SQLGATE_ALLOW_LOOPBACK`: Override loopback toggle (true/false)
    /// - `SQLGATE_ALLOW_PRIVATE_NETWORK`: Override private-network toggle (true/false)
    /// - `SQLGATE_REVALIDATE_MINUTES`: Override the policy re-check cadence
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("SQLGATE_ALLOW_LOOPBACK") {
            if let Ok(allow) = val.parse() {
                config.policy.allow_loopback = allow;
                tracing::debug!("Override allow_loopback from env: {}", allow);
            }
        }

        if let Ok(val) = std::env::var("SQLGATE_ALLOW_PRIVATE_NETWORK") {
            if let Ok(allow) = val.parse() {
                config.policy.allow_private_network = allow;
                tracing::debug!("Override allow_private_network from env: {}", allow);
            }
        }

        if let Ok(val) = std::env::var("SQLGATE_REVALIDATE_MINUTES") {
            if let Ok(minutes) = val.parse() {
                config.session.revalidate_minutes = minutes;
                tracing::debug!("Override revalidate_minutes from env: {}", minutes);
            }
        }

        Ok(config)
    }

    /// Save the configuration to disk.
    ///
    /// # Errors
    /// Returns error if the config directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        tracing::info!("Saved config to {}", config_path.display());

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError::NoConfigDir` if XDG directories are unavailable.
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "sqlgate", "sqlgate")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Network-destination and credential policy settings.
///
/// `allowed_addresses`, `include_databases`, and `exclude_databases` hold
/// raw operator text; syntax is validated when the policy and filter
/// snapshots are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PolicyConfig {
    /// Allow integrated/OS authentication
    pub allow_integrated_auth: bool,
    /// Allow callers to request trusting the server certificate
    pub allow_trust_server_certificate: bool,
    /// Allow connections to loopback addresses (ignored when
    /// `allowed_addresses` is non-empty)
    pub allow_loopback: bool,
    /// Allow connections to private/reserved networks (ignored when
    /// `allowed_addresses` is non-empty)
    pub allow_private_network: bool,
    /// Explicit allow-list of addresses or ranges (bare IP, CIDR, or
    /// dotted subnet mask). When non-empty it is the sole authority.
    pub allowed_addresses: Vec<String>,
    /// Wildcard patterns of database names to offer (`*` any run,
    /// `_` any single character); empty means all
    pub include_databases: Vec<String>,
    /// Wildcard patterns of database names to hide; deny wins over include
    pub exclude_databases: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow_integrated_auth: false,
            allow_trust_server_certificate: false,
            allow_loopback: false,
            allow_private_network: false,
            allowed_addresses: Vec::new(),
            include_databases: Vec::new(),
            exclude_databases: Vec::new(),
        }
    }
}

/// Session and secret lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minutes after authentication before the policy is re-checked
    pub revalidate_minutes: u64,
    /// Sliding lifetime of durable stored secrets, in hours
    pub secret_ttl_hours: u64,
    /// Sliding lifetime of temporary credentials, in minutes
    pub temp_ttl_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            revalidate_minutes: 5,
            secret_ttl_hours: 3,
            temp_ttl_minutes: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert!(!config.policy.allow_integrated_auth);
        assert!(!config.policy.allow_loopback);
        assert!(config.policy.allowed_addresses.is_empty());
        assert_eq!(config.session.revalidate_minutes, 5);
        assert_eq!(config.session.secret_ttl_hours, 3);
        assert_eq!(config.session.temp_ttl_minutes, 10);
    }

    #[test]
    fn test_config_serialization() {
        let config = GateConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[policy]"));
        assert!(toml_str.contains("[session]"));

        let parsed: GateConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(
            parsed.session.revalidate_minutes,
            config.session.revalidate_minutes
        );
    }

    #[test]
    fn test_config_partial_toml() {
        let parsed: GateConfig = toml::from_str(
            r#"
            [policy]
            allow_loopback = true
            allowed_addresses = ["192.168.1.0/24", "10.0.0.1"]
            exclude_databases = ["master", "tempdb"]
            "#,
        )
        .expect("parse partial config");

        assert!(parsed.policy.allow_loopback);
        assert_eq!(parsed.policy.allowed_addresses.len(), 2);
        assert_eq!(parsed.policy.exclude_databases.len(), 2);
        // Unspecified sections fall back to defaults
        assert_eq!(parsed.session.revalidate_minutes, 5);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = GateConfig::default();
        config.policy.allow_loopback = true;
        config.session.revalidate_minutes = 10;

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: GateConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert!(loaded.policy.allow_loopback);
        assert_eq!(loaded.session.revalidate_minutes, 10);
    }

    #[test]
    fn test_config_invalid_toml() {
        let result: Result<GateConfig, _> = toml::from_str("policy = \"not a table\"");
        assert!(result.is_err());
    }
}
