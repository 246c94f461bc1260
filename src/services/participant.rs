//! Participant admission service
//!
//! The three admission paths (invite token, invite code, public self-join)
//! funnel through shared admissibility and duplicate checks. Membership can
//! only change while the event is still in `Created`; collaborator
//! promotion is owner-only and exempt from that gate.

use std::sync::Arc;

use tracing::info;

use crate::database::store::{EventStore, ParticipantStore, UserStore};
use crate::models::{Event, EventState, NewParticipant, Participant, ParticipantStatus};
use crate::services::auth::AuthorizationGuard;
use crate::services::status::StatusTracker;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::{codes, logging};

#[derive(Clone)]
pub struct ParticipantService {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    participants: Arc<dyn ParticipantStore>,
    tracker: StatusTracker,
    guard: AuthorizationGuard,
}

impl ParticipantService {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserStore>,
        participants: Arc<dyn ParticipantStore>,
        tracker: StatusTracker,
        guard: AuthorizationGuard,
    ) -> Self {
        Self {
            events,
            users,
            participants,
            tracker,
            guard,
        }
    }

    /// Only `Created` events accept new participants
    fn ensure_accepting_participants(event: &Event) -> Result<()> {
        if event.state != EventState::Created {
            return Err(GatherlyError::NotAdmitting {
                event_id: event.id,
                state: event.state.to_string(),
            });
        }
        Ok(())
    }

    /// Membership mutations (removal, confirmation) are only legal while
    /// the event is still `Created`
    fn ensure_membership_mutable(event: &Event) -> Result<()> {
        if event.state != EventState::Created {
            return Err(GatherlyError::InvalidState {
                event_id: event.id,
                state: event.state.to_string(),
            });
        }
        Ok(())
    }

    async fn ensure_not_participating(&self, event_id: i64, user_id: i64) -> Result<()> {
        if self
            .participants
            .find_by_event_and_user(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(GatherlyError::AlreadyParticipating { event_id, user_id });
        }
        Ok(())
    }

    async fn admit(&self, event: &Event, user_id: i64, path: &str) -> Result<Participant> {
        Self::ensure_accepting_participants(event)?;
        self.ensure_not_participating(event.id, user_id).await?;

        self.users
            .get(user_id)
            .await?
            .ok_or(GatherlyError::UserNotFound { user_id })?;

        let participant = self
            .participants
            .create(NewParticipant {
                event_id: event.id,
                user_id,
                status: ParticipantStatus::Invited,
                is_collaborator: false,
            })
            .await?;
        self.tracker.record_initial(&participant).await?;

        logging::log_admission(event.id, user_id, path, true);
        Ok(participant)
    }

    /// Admit a user through an invite token
    ///
    /// When an invite code is supplied alongside the token it must match
    /// the event's code exactly.
    pub async fn admit_by_token(
        &self,
        invite_token: &str,
        invite_code: Option<&str>,
        user_id: i64,
    ) -> Result<Participant> {
        if invite_token.trim().is_empty() {
            return Err(GatherlyError::Validation(
                "Invite token is required".to_string(),
            ));
        }

        let event = self
            .events
            .find_by_invite_token(invite_token)
            .await?
            .ok_or(GatherlyError::InviteNotFound)?;

        if let Some(code) = invite_code {
            if event.invite_code.as_deref() != Some(code) {
                return Err(GatherlyError::Validation(
                    "Invite code does not match this invite".to_string(),
                ));
            }
        }

        self.admit(&event, user_id, "invite_token").await
    }

    /// Admit a user through an 8-character invite code
    pub async fn admit_by_code(&self, invite_code: &str, user_id: i64) -> Result<Participant> {
        if !codes::is_valid_code_format(invite_code) {
            return Err(GatherlyError::Validation(
                "Invite code must be 8 characters, uppercase letters and digits only".to_string(),
            ));
        }

        let event = self
            .events
            .find_by_invite_code(invite_code)
            .await?
            .ok_or(GatherlyError::InviteNotFound)?;

        self.admit(&event, user_id, "invite_code").await
    }

    /// Self-join a public event
    ///
    /// Visibility is checked before the admissibility and duplicate checks.
    pub async fn join_public(&self, event_id: i64, user_id: i64) -> Result<Participant> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        if event.visibility != crate::models::Visibility::Public {
            return Err(GatherlyError::Validation(
                "This event is not public and requires an invite".to_string(),
            ));
        }

        self.admit(&event, user_id, "public_join").await
    }

    /// Remove a participant, cascading its history
    ///
    /// Allowed for the owner, a collaborator, or the participant themself;
    /// membership is frozen once the event leaves `Created`, including for
    /// self-leave.
    pub async fn remove_participant(
        &self,
        event_id: i64,
        target_user_id: i64,
        acting_user_id: i64,
    ) -> Result<()> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        self.guard
            .ensure_organizer_or_self(&event, target_user_id, acting_user_id)
            .await?;
        Self::ensure_membership_mutable(&event)?;

        let participant = self
            .participants
            .find_by_event_and_user(event_id, target_user_id)
            .await?
            .ok_or(GatherlyError::NotParticipating {
                event_id,
                user_id: target_user_id,
            })?;

        self.participants.delete(participant.id).await?;
        info!(
            event_id = event_id,
            user_id = target_user_id,
            acting_user_id = acting_user_id,
            "Participant removed"
        );
        Ok(())
    }

    /// Confirm a participant
    ///
    /// Participants confirm themselves; confirming someone else requires
    /// the owner or a collaborator.
    pub async fn confirm_participant(
        &self,
        event_id: i64,
        target_user_id: i64,
        acting_user_id: i64,
    ) -> Result<Participant> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        Self::ensure_membership_mutable(&event)?;
        if acting_user_id != target_user_id {
            self.guard.ensure_organizer(&event, acting_user_id).await?;
        }

        let participant = self
            .participants
            .find_by_event_and_user(event_id, target_user_id)
            .await?
            .ok_or(GatherlyError::NotParticipating {
                event_id,
                user_id: target_user_id,
            })?;

        self.tracker
            .transition(participant.id, ParticipantStatus::Confirmed)
            .await
    }

    /// Grant collaborator privileges; owner only, no membership-state gate
    pub async fn promote_collaborator(
        &self,
        event_id: i64,
        target_user_id: i64,
        acting_user_id: i64,
    ) -> Result<Participant> {
        self.set_collaborator(event_id, target_user_id, acting_user_id, true)
            .await
    }

    /// Revoke collaborator privileges; owner only, no membership-state gate
    pub async fn demote_collaborator(
        &self,
        event_id: i64,
        target_user_id: i64,
        acting_user_id: i64,
    ) -> Result<Participant> {
        self.set_collaborator(event_id, target_user_id, acting_user_id, false)
            .await
    }

    async fn set_collaborator(
        &self,
        event_id: i64,
        target_user_id: i64,
        acting_user_id: i64,
        is_collaborator: bool,
    ) -> Result<Participant> {
        let event = self
            .events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;

        self.guard.ensure_owner(&event, acting_user_id).await?;

        let mut participant = self
            .participants
            .find_by_event_and_user(event_id, target_user_id)
            .await?
            .ok_or(GatherlyError::NotParticipating {
                event_id,
                user_id: target_user_id,
            })?;

        participant.is_collaborator = is_collaborator;
        let participant = self.participants.save(participant).await?;

        info!(
            event_id = event_id,
            user_id = target_user_id,
            is_collaborator = is_collaborator,
            "Collaborator flag changed"
        );
        Ok(participant)
    }

    /// All participants of an event
    pub async fn list_participants(&self, event_id: i64) -> Result<Vec<Participant>> {
        self.events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })?;
        self.participants.find_by_event(event_id).await
    }
}
