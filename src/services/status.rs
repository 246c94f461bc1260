//! Participant status tracking
//!
//! Owns the participant status state machine and its append-only history
//! log. Every transition records the status being exited together with the
//! clock instant, then overwrites the current status.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::database::store::ParticipantStore;
use crate::models::{Participant, ParticipantStatus};
use crate::utils::clock::Clock;
use crate::utils::errors::{GatherlyError, Result};

#[derive(Clone)]
pub struct StatusTracker {
    participants: Arc<dyn ParticipantStore>,
    clock: Arc<dyn Clock>,
}

impl StatusTracker {
    pub fn new(participants: Arc<dyn ParticipantStore>, clock: Arc<dyn Clock>) -> Self {
        Self { participants, clock }
    }

    /// Transition a participant to a new status
    ///
    /// Appends one history entry holding the previous status, then
    /// overwrites `current_status`. No ordering is enforced; any status can
    /// follow any other.
    pub async fn transition(
        &self,
        participant_id: i64,
        new_status: ParticipantStatus,
    ) -> Result<Participant> {
        let mut participant = self
            .participants
            .get(participant_id)
            .await?
            .ok_or(GatherlyError::ParticipantNotFound { participant_id })?;

        let previous = participant.current_status;
        self.participants
            .append_history(participant.id, previous, self.clock.now())
            .await?;

        participant.current_status = new_status;
        let participant = self.participants.save(participant).await?;

        debug!(
            participant_id = participant.id,
            from = %previous,
            to = %new_status,
            "Participant status changed"
        );
        Ok(participant)
    }

    /// Record the creation-time history entry for a fresh participant row
    pub async fn record_initial(&self, participant: &Participant) -> Result<()> {
        self.participants
            .append_history(participant.id, participant.current_status, self.clock.now())
            .await?;
        Ok(())
    }

    /// Count participants per current status
    pub async fn current_status_counts(
        &self,
        event_id: i64,
    ) -> Result<HashMap<ParticipantStatus, usize>> {
        let participants = self.participants.find_by_event(event_id).await?;
        let mut counts = HashMap::new();
        for participant in &participants {
            *counts.entry(participant.current_status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// Count participants that ever held each status
    ///
    /// A participant counts toward a status when it appears in its history
    /// or is its current status, so totals can exceed the current counts.
    pub async fn ever_held_counts(
        &self,
        event_id: i64,
    ) -> Result<HashMap<ParticipantStatus, usize>> {
        let participants = self.participants.find_by_event(event_id).await?;
        let mut counts = HashMap::new();
        for participant in &participants {
            let mut held: Vec<ParticipantStatus> =
                participant.history.iter().map(|change| change.status).collect();
            held.push(participant.current_status);
            held.sort_by_key(|status| *status as u8);
            held.dedup();
            for status in held {
                *counts.entry(status).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::models::NewParticipant;
    use crate::utils::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (StatusTracker, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let tracker = StatusTracker::new(store.clone(), clock.clone());
        (tracker, store, clock)
    }

    async fn new_participant(store: &Arc<MemoryStore>, status: ParticipantStatus) -> Participant {
        ParticipantStore::create(
            store.as_ref(),
            NewParticipant {
                event_id: 1,
                user_id: 1,
                status,
                is_collaborator: false,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_transition_records_previous_status() {
        let (tracker, store, clock) = setup().await;
        let participant = new_participant(&store, ParticipantStatus::Invited).await;
        tracker.record_initial(&participant).await.unwrap();

        clock.advance(chrono::Duration::minutes(10));
        let updated = tracker
            .transition(participant.id, ParticipantStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(updated.current_status, ParticipantStatus::Confirmed);
        assert_eq!(updated.history.len(), 2);
        assert_eq!(updated.history[1].status, ParticipantStatus::Invited);
        assert_eq!(updated.history[1].changed_at, clock.now());
    }

    #[tokio::test]
    async fn test_history_grows_once_per_transition() {
        let (tracker, store, _clock) = setup().await;
        let participant = new_participant(&store, ParticipantStatus::Invited).await;
        tracker.record_initial(&participant).await.unwrap();

        tracker
            .transition(participant.id, ParticipantStatus::Confirmed)
            .await
            .unwrap();
        tracker
            .transition(participant.id, ParticipantStatus::Present)
            .await
            .unwrap();
        let updated = tracker
            .transition(participant.id, ParticipantStatus::Confirmed)
            .await
            .unwrap();

        // Creation entry plus one per transition
        assert_eq!(updated.history.len(), 4);
        assert_eq!(updated.history[2].status, ParticipantStatus::Confirmed);
        assert_eq!(updated.history[3].status, ParticipantStatus::Present);
    }

    #[tokio::test]
    async fn test_transition_missing_participant() {
        let (tracker, _store, _clock) = setup().await;
        let err = tracker
            .transition(42, ParticipantStatus::Present)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatherlyError::ParticipantNotFound { participant_id: 42 }
        ));
    }

    #[tokio::test]
    async fn test_ever_held_diverges_from_current() {
        let (tracker, store, _clock) = setup().await;
        let participant = new_participant(&store, ParticipantStatus::Invited).await;
        tracker.record_initial(&participant).await.unwrap();
        tracker
            .transition(participant.id, ParticipantStatus::Confirmed)
            .await
            .unwrap();
        tracker
            .transition(participant.id, ParticipantStatus::Present)
            .await
            .unwrap();

        let current = tracker.current_status_counts(1).await.unwrap();
        assert_eq!(current.get(&ParticipantStatus::Confirmed), None);
        assert_eq!(current.get(&ParticipantStatus::Present), Some(&1));

        let ever = tracker.ever_held_counts(1).await.unwrap();
        assert_eq!(ever.get(&ParticipantStatus::Invited), Some(&1));
        assert_eq!(ever.get(&ParticipantStatus::Confirmed), Some(&1));
        assert_eq!(ever.get(&ParticipantStatus::Present), Some(&1));
    }
}
