//! Configuration resolution for catalog-rs
//!
//! Sync settings come from CLI → ENV → TOML → built-in defaults, highest
//! priority first.

use catalog_common::config::{RegionaisConfig, TomlConfig};
use std::time::Duration;
use tracing::{info, warn};

use crate::services::{DEFAULT_REGIONAIS_URL, DEFAULT_TIMEOUT};

/// Module name, used for the TOML file name and logs
pub const MODULE_NAME: &str = "catalog-rs";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5731;

/// Environment variable overriding the external regional URL
pub const REGIONAIS_URL_ENV: &str = "CATALOG_REGIONAIS_URL";

/// Resolved regional sync settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub url: String,
    pub timeout: Duration,
    /// Create the single-active unique index at startup
    pub enforce_single_active: bool,
    /// Serialize sync runs within the process
    pub serialize_runs: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGIONAIS_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            enforce_single_active: false,
            serialize_runs: false,
        }
    }
}

impl SyncSettings {
    /// Resolve using the process environment
    pub fn resolve(cli_url: Option<&str>, toml: &RegionaisConfig) -> Self {
        let env_url = std::env::var(REGIONAIS_URL_ENV).ok();
        Self::resolve_with_env(cli_url, env_url.as_deref(), toml)
    }

    pub fn resolve_with_env(
        cli_url: Option<&str>,
        env_url: Option<&str>,
        toml: &RegionaisConfig,
    ) -> Self {
        let toml_url = toml.url.as_deref();

        let url = if let Some(url) = cli_url.filter(|u| is_valid_url(u)) {
            info!("Regionais URL from command line");
            url.to_string()
        } else if let Some(url) = env_url.filter(|u| is_valid_url(u)) {
            info!("Regionais URL from {}", REGIONAIS_URL_ENV);
            url.to_string()
        } else if let Some(url) = toml_url.filter(|u| is_valid_url(u)) {
            info!("Regionais URL from TOML config");
            url.to_string()
        } else {
            DEFAULT_REGIONAIS_URL.to_string()
        };

        let timeout = match toml.timeout_secs {
            Some(0) => {
                warn!("regionais.timeout_secs = 0 is invalid, using default");
                DEFAULT_TIMEOUT
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Self {
            url,
            timeout,
            enforce_single_active: toml.enforce_single_active,
            serialize_runs: toml.serialize_runs,
        }
    }
}

/// HTTP port: CLI → TOML → default
pub fn resolve_port(cli_port: Option<u16>, toml: &TomlConfig) -> u16 {
    cli_port.or(toml.port).unwrap_or(DEFAULT_PORT)
}

/// Non-empty, non-whitespace
pub fn is_valid_url(url: &str) -> bool {
    !url.trim().is_empty()
}
