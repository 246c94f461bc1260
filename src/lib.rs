//! Gatherly event management service
//!
//! This library provides the event lifecycle, participant admission and
//! attendance check-in core: two interacting state machines, a time-driven
//! sweep, collision-free invite codes and QR-based presence confirmation.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ErrorCategory, GatherlyError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, MemoryStore};
pub use services::ServiceFactory;
pub use utils::clock::{Clock, ManualClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
