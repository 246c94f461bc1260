//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{GatherlyError, Result};

/// Largest representable zone offset (UTC±14:00)
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_lifecycle_config(&settings.lifecycle)?;
    validate_logging_config(&settings.logging)?;
    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(GatherlyError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(GatherlyError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(GatherlyError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate lifecycle configuration
fn validate_lifecycle_config(config: &super::LifecycleConfig) -> Result<()> {
    if config.sweep_interval_secs == 0 {
        return Err(GatherlyError::Config(
            "Sweep interval must be greater than 0".to_string(),
        ));
    }

    if config.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(GatherlyError::Config(format!(
            "UTC offset must be within ±{MAX_OFFSET_MINUTES} minutes"
        )));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(GatherlyError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(GatherlyError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
