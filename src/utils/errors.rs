//! Error handling for Gatherly
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for Gatherly operations
#[derive(Error, Debug)]
pub enum GatherlyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: i64 },

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Attendance token not found")]
    TokenNotFound,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Event {event_id} is in state {state} which does not allow this operation")]
    InvalidState { event_id: i64, state: String },

    #[error("Event {event_id} is not accepting participants (state {state})")]
    NotAdmitting { event_id: i64, state: String },

    #[error("User {user_id} is already participating in event {event_id}")]
    AlreadyParticipating { event_id: i64, user_id: i64 },

    #[error("User {user_id} is not participating in event {event_id}")]
    NotParticipating { event_id: i64, user_id: i64 },

    #[error("Participant {participant_id} is already present")]
    AlreadyPresent { participant_id: i64 },

    #[error("Could not generate a unique invite code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    #[error("QR encoding error: {0}")]
    QrEncoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Gatherly operations
pub type Result<T> = std::result::Result<T, GatherlyError>;

/// Response category a boundary layer should map an error to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest,
    NotFound,
    Forbidden,
    Conflict,
    Internal,
}

impl GatherlyError {
    /// Map the error to its boundary response category
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatherlyError::Validation(_) => ErrorCategory::BadRequest,
            GatherlyError::InvalidState { .. } => ErrorCategory::BadRequest,
            GatherlyError::NotAdmitting { .. } => ErrorCategory::BadRequest,
            GatherlyError::UserNotFound { .. } => ErrorCategory::NotFound,
            GatherlyError::EventNotFound { .. } => ErrorCategory::NotFound,
            GatherlyError::ParticipantNotFound { .. } => ErrorCategory::NotFound,
            GatherlyError::InviteNotFound => ErrorCategory::NotFound,
            GatherlyError::TokenNotFound => ErrorCategory::NotFound,
            GatherlyError::Forbidden(_) => ErrorCategory::Forbidden,
            GatherlyError::AlreadyParticipating { .. } => ErrorCategory::Conflict,
            GatherlyError::NotParticipating { .. } => ErrorCategory::Conflict,
            GatherlyError::AlreadyPresent { .. } => ErrorCategory::Conflict,
            GatherlyError::Database(_)
            | GatherlyError::Migration(_)
            | GatherlyError::Config(_)
            | GatherlyError::CodeSpaceExhausted { .. }
            | GatherlyError::QrEncoding(_)
            | GatherlyError::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the error indicates a systemic fault that should be surfaced loudly
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            GatherlyError::CodeSpaceExhausted { .. }
                | GatherlyError::Database(_)
                | GatherlyError::Migration(_)
        )
    }
}
