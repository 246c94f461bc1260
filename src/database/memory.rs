//! In-memory entity store
//!
//! A `Mutex<HashMap>` implementation of the store contracts with the same
//! cascade semantics as the Postgres schema. Used by the test suites and
//! useful for running the service without a database.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::store::{EventStore, ParticipantStore, UserStore};
use crate::models::{
    CreateUserRequest, Event, EventState, NewEvent, NewParticipant, Participant,
    ParticipantStatus, StatusChange, User,
};
use crate::utils::errors::Result;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<i64, User>,
    events: HashMap<i64, Event>,
    participants: HashMap<i64, Participant>,
    next_user_id: i64,
    next_event_id: i64,
    next_participant_id: i64,
    next_history_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            name: request.name,
            username: request.username,
            email: request.email,
            photo: request.photo,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events.get(&id).cloned())
    }

    async fn find_by_invite_token(&self, token: &str) -> Result<Option<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .values()
            .find(|event| event.invite_token.as_deref() == Some(token))
            .cloned())
    }

    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .values()
            .find(|event| event.invite_code.as_deref() == Some(code))
            .cloned())
    }

    async fn find_by_states(&self, states: &[EventState]) -> Result<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|event| states.contains(&event.state))
            .cloned()
            .collect();
        events.sort_by_key(|event| event.id);
        Ok(events)
    }

    async fn assigned_invite_codes(&self) -> Result<HashSet<String>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .values()
            .filter_map(|event| event.invite_code.clone())
            .collect())
    }

    async fn create(&self, event: NewEvent, state: EventState) -> Result<Event> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_event_id += 1;
        let event = Event {
            id: inner.next_event_id,
            name: event.name,
            description: event.description,
            location: event.location,
            date_fixed_start: event.date_fixed_start,
            date_fixed_end: event.date_fixed_end,
            time_fixed_start: event.time_fixed_start,
            time_fixed_end: event.time_fixed_end,
            date_start: None,
            date_end: None,
            time_start: None,
            time_end: None,
            max_participants: event.max_participants,
            visibility: event.visibility,
            state,
            owner_id: event.owner_id,
            collaborators: Vec::new(),
            invite_token: None,
            invite_code: None,
        };
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn save(&self, event: Event) -> Result<Event> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.remove(&id);
        inner.participants.retain(|_, p| p.event_id != id);
        Ok(())
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Participant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.participants.get(&id).cloned())
    }

    async fn find_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .participants
            .values()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
            .cloned())
    }

    async fn find_by_event(&self, event_id: i64) -> Result<Vec<Participant>> {
        let inner = self.inner.lock().unwrap();
        let mut participants: Vec<Participant> = inner
            .participants
            .values()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.id);
        Ok(participants)
    }

    async fn find_by_event_and_status(
        &self,
        event_id: i64,
        status: ParticipantStatus,
    ) -> Result<Vec<Participant>> {
        let mut participants = self.find_by_event(event_id).await?;
        participants.retain(|p| p.current_status == status);
        Ok(participants)
    }

    async fn find_by_attendance_token(&self, token: &str) -> Result<Option<Participant>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .participants
            .values()
            .find(|p| p.attendance_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, participant: NewParticipant) -> Result<Participant> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_participant_id += 1;
        let participant = Participant {
            id: inner.next_participant_id,
            event_id: participant.event_id,
            user_id: participant.user_id,
            current_status: participant.status,
            is_collaborator: participant.is_collaborator,
            attendance_token: None,
            history: Vec::new(),
        };
        inner.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn save(&self, participant: Participant) -> Result<Participant> {
        let mut inner = self.inner.lock().unwrap();
        // History is append-only through append_history; keep whatever is
        // already recorded for the row.
        let history = inner
            .participants
            .get(&participant.id)
            .map(|existing| existing.history.clone())
            .unwrap_or_default();
        let mut participant = participant;
        participant.history = history;
        inner.participants.insert(participant.id, participant.clone());
        Ok(participant)
    }

    async fn append_history(
        &self,
        participant_id: i64,
        status: ParticipantStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<StatusChange> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_history_id += 1;
        let change = StatusChange {
            id: inner.next_history_id,
            participant_id,
            status,
            changed_at,
        };
        if let Some(participant) = inner.participants.get_mut(&participant_id) {
            participant.history.push(change.clone());
        }
        Ok(change)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.participants.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn sample_event() -> NewEvent {
        NewEvent {
            name: "Launch party".to_string(),
            description: "Office launch party".to_string(),
            location: "HQ rooftop".to_string(),
            date_fixed_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            date_fixed_end: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            time_fixed_start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            time_fixed_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            max_participants: 50,
            visibility: crate::models::Visibility::Public,
            owner_id: 1,
        }
    }

    #[tokio::test]
    async fn test_event_roundtrip_and_lookup() {
        let store = MemoryStore::new();
        let mut event = EventStore::create(&store, sample_event(), EventState::Created)
            .await
            .unwrap();
        event.invite_token = Some("tok".to_string());
        event.invite_code = Some("ABCD1234".to_string());
        EventStore::save(&store, event.clone()).await.unwrap();

        let by_token = store.find_by_invite_token("tok").await.unwrap().unwrap();
        assert_eq!(by_token.id, event.id);
        let by_code = store.find_by_invite_code("ABCD1234").await.unwrap().unwrap();
        assert_eq!(by_code.id, event.id);
        assert!(store
            .assigned_invite_codes()
            .await
            .unwrap()
            .contains("ABCD1234"));
    }

    #[tokio::test]
    async fn test_event_delete_cascades_participants() {
        let store = MemoryStore::new();
        let event = EventStore::create(&store, sample_event(), EventState::Created)
            .await
            .unwrap();
        let participant = ParticipantStore::create(
            &store,
            NewParticipant {
                event_id: event.id,
                user_id: 9,
                status: ParticipantStatus::Invited,
                is_collaborator: false,
            },
        )
        .await
        .unwrap();

        EventStore::delete(&store, event.id).await.unwrap();
        assert!(ParticipantStore::get(&store, participant.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_save_does_not_rewrite_history() {
        let store = MemoryStore::new();
        let event = EventStore::create(&store, sample_event(), EventState::Created)
            .await
            .unwrap();
        let participant = ParticipantStore::create(
            &store,
            NewParticipant {
                event_id: event.id,
                user_id: 9,
                status: ParticipantStatus::Invited,
                is_collaborator: false,
            },
        )
        .await
        .unwrap();
        store
            .append_history(participant.id, ParticipantStatus::Invited, Utc::now())
            .await
            .unwrap();

        // A stale copy with empty history must not erase the appended entry.
        ParticipantStore::save(&store, participant).await.unwrap();
        let reloaded = ParticipantStore::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(reloaded.history.len(), 1);
    }
}
