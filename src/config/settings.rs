//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Lifecycle sweep and time-zone configuration
///
/// Every schedule comparison in the service uses the configured offset;
/// the ambient process time zone is never consulted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LifecycleConfig {
    /// Interval between automatic state sweeps, in seconds
    pub sweep_interval_secs: u64,
    /// Canonical time zone as a fixed offset from UTC, in minutes
    pub utc_offset_minutes: i32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("gatherly").required(false))
            .add_source(config::Environment::with_prefix("GATHERLY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::GatherlyError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/gatherly".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            lifecycle: LifecycleConfig {
                sweep_interval_secs: 60,
                utc_offset_minutes: -180,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/gatherly".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.lifecycle.sweep_interval_secs, 60);
    }
}
