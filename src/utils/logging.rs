//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the Gatherly service.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
///
/// Returns the appender guard; dropping it stops the background writer, so
/// the caller must keep it alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "gatherly.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle actions with structured data
pub fn log_event_action(event_id: i64, action: &str, user_id: Option<i64>, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log admission and removal decisions
pub fn log_admission(event_id: i64, user_id: i64, path: &str, admitted: bool) {
    if admitted {
        info!(
            event_id = event_id,
            user_id = user_id,
            path = path,
            "Participant admitted"
        );
    } else {
        warn!(
            event_id = event_id,
            user_id = user_id,
            path = path,
            "Admission rejected"
        );
    }
}

/// Log attendance check-in outcomes
pub fn log_checkin(participant_id: i64, event_id: i64, action: &str, details: Option<&str>) {
    info!(
        participant_id = participant_id,
        event_id = event_id,
        action = action,
        details = details,
        "Check-in action performed"
    );
}
