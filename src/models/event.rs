//! Event model
//!
//! An event carries two schedules: the fixed window declared by the
//! organizer at creation time, and the actual start/end stamped when the
//! lifecycle transitions really happen.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an event
///
/// `Created -> Active -> Finished`, with `Canceled` reachable from
/// `Created` and `Active`. `Finished` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_state", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventState {
    Created,
    Active,
    Finished,
    Canceled,
}

impl sqlx::postgres::PgHasArrayType for EventState {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_event_state")
    }
}

impl EventState {
    /// Terminal states never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventState::Finished | EventState::Canceled)
    }
}

impl std::fmt::Display for EventState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventState::Created => "CREATED",
            EventState::Active => "ACTIVE",
            EventState::Finished => "FINISHED",
            EventState::Canceled => "CANCELED",
        };
        write!(f, "{s}")
    }
}

/// Who can see and self-join an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_visibility", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_fixed_start: NaiveDate,
    pub date_fixed_end: NaiveDate,
    pub time_fixed_start: NaiveTime,
    pub time_fixed_end: NaiveTime,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub max_participants: i32,
    pub visibility: Visibility,
    pub state: EventState,
    pub owner_id: i64,
    pub collaborators: Vec<i64>,
    pub invite_token: Option<String>,
    pub invite_code: Option<String>,
}

impl Event {
    /// Organizer-declared start instant
    pub fn fixed_starts_at(&self) -> NaiveDateTime {
        self.date_fixed_start.and_time(self.time_fixed_start)
    }

    /// Organizer-declared end instant
    pub fn fixed_ends_at(&self) -> NaiveDateTime {
        self.date_fixed_end.and_time(self.time_fixed_end)
    }

    /// Actual start when stamped, falling back to the fixed schedule
    pub fn starts_at(&self) -> NaiveDateTime {
        match (self.date_start, self.time_start) {
            (Some(date), Some(time)) => date.and_time(time),
            _ => self.fixed_starts_at(),
        }
    }

    pub fn is_collaborator(&self, user_id: i64) -> bool {
        self.collaborators.contains(&user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_fixed_start: NaiveDate,
    pub date_fixed_end: NaiveDate,
    pub time_fixed_start: NaiveTime,
    pub time_fixed_end: NaiveTime,
    pub max_participants: i32,
    pub visibility: Visibility,
    pub owner_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date_fixed_start: Option<NaiveDate>,
    pub date_fixed_end: Option<NaiveDate>,
    pub time_fixed_start: Option<NaiveTime>,
    pub time_fixed_end: Option<NaiveTime>,
    pub max_participants: Option<i32>,
    pub visibility: Option<Visibility>,
    pub owner_id: Option<i64>,
}

/// Invite credentials for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub event_id: i64,
    pub token: String,
    pub code: String,
}
