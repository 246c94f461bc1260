//! Entity store contracts
//!
//! The lifecycle, admission and check-in services only require load-by-id,
//! load-by-predicate and save semantics; these traits are that seam. The
//! Postgres repositories implement them for production and
//! [`crate::database::memory::MemoryStore`] implements them for tests.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::models::{
    CreateUserRequest, Event, EventState, NewEvent, NewParticipant, Participant,
    ParticipantStatus, StatusChange, User,
};
use crate::utils::errors::Result;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<User>>;
    async fn create(&self, request: CreateUserRequest) -> Result<User>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Event>>;
    async fn find_by_invite_token(&self, token: &str) -> Result<Option<Event>>;
    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Event>>;
    /// Events currently in any of the given states
    async fn find_by_states(&self, states: &[EventState]) -> Result<Vec<Event>>;
    /// Every invite code currently assigned to an event
    async fn assigned_invite_codes(&self) -> Result<HashSet<String>>;
    async fn create(&self, event: NewEvent, state: EventState) -> Result<Event>;
    async fn save(&self, event: Event) -> Result<Event>;
    /// Delete the event, cascading to its participants and their history
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Participant>>;
    async fn find_by_event_and_user(&self, event_id: i64, user_id: i64)
        -> Result<Option<Participant>>;
    async fn find_by_event(&self, event_id: i64) -> Result<Vec<Participant>>;
    async fn find_by_event_and_status(
        &self,
        event_id: i64,
        status: ParticipantStatus,
    ) -> Result<Vec<Participant>>;
    /// Participant whose latest issued attendance token matches
    async fn find_by_attendance_token(&self, token: &str) -> Result<Option<Participant>>;
    async fn create(&self, participant: NewParticipant) -> Result<Participant>;
    async fn save(&self, participant: Participant) -> Result<Participant>;
    /// Append one immutable history entry
    async fn append_history(
        &self,
        participant_id: i64,
        status: ParticipantStatus,
        changed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<StatusChange>;
    /// Delete the participant, cascading to its history
    async fn delete(&self, id: i64) -> Result<()>;
}
