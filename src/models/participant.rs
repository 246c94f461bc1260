//! Participant model
//!
//! A participant binds one user to one event. Status changes are recorded
//! in an append-only history; entries are never rewritten or deleted while
//! the participant exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admission status of a participant
///
/// `Invited -> Confirmed -> Present` in the normal flow; the data layer
/// does not enforce ordering, it only records every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ParticipantStatus {
    Invited,
    Confirmed,
    Present,
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParticipantStatus::Invited => "INVITED",
            ParticipantStatus::Confirmed => "CONFIRMED",
            ParticipantStatus::Present => "PRESENT",
        };
        write!(f, "{s}")
    }
}

/// One append-only history entry: the status being exited and when
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatusChange {
    pub id: i64,
    pub participant_id: i64,
    pub status: ParticipantStatus,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub current_status: ParticipantStatus,
    pub is_collaborator: bool,
    /// Latest issued attendance token; overwritten on each issuance
    pub attendance_token: Option<String>,
    pub history: Vec<StatusChange>,
}

impl Participant {
    /// Instant the participant entered its current status, taken from the
    /// most recent history entry
    pub fn status_entered_at(&self) -> Option<DateTime<Utc>> {
        self.history.last().map(|change| change.changed_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipant {
    pub event_id: i64,
    pub user_id: i64,
    pub status: ParticipantStatus,
    pub is_collaborator: bool,
}
