//! Attendance check-in service
//!
//! Lets organizers confirm physical presence: a participant displays a
//! short-lived 6-digit token rendered as a QR image, and staff redeem it.
//! Only the latest token issued to a participant is redeemable; issuing a
//! new one overwrites the stored value.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::store::{EventStore, ParticipantStore, UserStore};
use crate::models::{Event, EventState, ParticipantStatus, User};
use crate::services::auth::AuthorizationGuard;
use crate::services::qr::QrEncoder;
use crate::services::status::StatusTracker;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::{codes, logging};

/// Token issuance payload: the raw token plus its QR rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendancePass {
    pub participant_id: i64,
    pub event_name: String,
    pub token: String,
    pub qr_image_base64: String,
}

/// Successful redemption payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfirmation {
    pub participant_id: i64,
    pub user_id: i64,
    pub status: ParticipantStatus,
    pub user_name: String,
    pub user_email: String,
}

/// Per-participant line in the attendance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub user_photo: Option<String>,
    pub is_collaborator: bool,
    pub status: ParticipantStatus,
}

/// Present/absent partition of an event's participants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub event_name: String,
    pub event_state: EventState,
    pub total_participants: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub present: Vec<ParticipantSummary>,
    pub absent: Vec<ParticipantSummary>,
}

/// A currently-present participant and when it was scanned in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentEntry {
    pub participant_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub status: ParticipantStatus,
    pub scanned_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Clone)]
pub struct CheckinService {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    participants: Arc<dyn ParticipantStore>,
    tracker: StatusTracker,
    guard: AuthorizationGuard,
    encoder: Arc<dyn QrEncoder>,
}

impl CheckinService {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserStore>,
        participants: Arc<dyn ParticipantStore>,
        tracker: StatusTracker,
        guard: AuthorizationGuard,
        encoder: Arc<dyn QrEncoder>,
    ) -> Self {
        Self {
            events,
            users,
            participants,
            tracker,
            guard,
            encoder,
        }
    }

    async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })
    }

    async fn get_user(&self, user_id: i64) -> Result<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or(GatherlyError::UserNotFound { user_id })
    }

    /// Issue a fresh attendance token for a participant of an active event
    ///
    /// The previous token, if any, stops being redeemable the moment the
    /// new value is stored.
    pub async fn issue_token(&self, event_id: i64, user_id: i64) -> Result<AttendancePass> {
        let event = self.get_event(event_id).await?;

        let mut participant = self
            .participants
            .find_by_event_and_user(event_id, user_id)
            .await?
            .ok_or(GatherlyError::NotParticipating { event_id, user_id })?;

        if event.state != EventState::Active {
            return Err(GatherlyError::InvalidState {
                event_id,
                state: event.state.to_string(),
            });
        }

        let token = codes::generate_attendance_token();
        participant.attendance_token = Some(token.clone());
        let participant = self.participants.save(participant).await?;

        let image = self.encoder.encode(&token)?;
        logging::log_checkin(participant.id, event_id, "issue_token", None);

        Ok(AttendancePass {
            participant_id: participant.id,
            event_name: event.name,
            token,
            qr_image_base64: BASE64.encode(image),
        })
    }

    /// Redeem a scanned attendance token, marking the participant present
    pub async fn redeem_token(
        &self,
        token: &str,
        acting_user_id: i64,
    ) -> Result<PresenceConfirmation> {
        let token = token.trim();
        if !codes::is_valid_attendance_token(token) {
            return Err(GatherlyError::Validation(
                "Attendance token must be a 6-digit code".to_string(),
            ));
        }

        let participant = self
            .participants
            .find_by_attendance_token(token)
            .await?
            .ok_or(GatherlyError::TokenNotFound)?;

        let event = self.get_event(participant.event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if event.state != EventState::Active {
            return Err(GatherlyError::Validation(
                "Presence can only be confirmed for active events".to_string(),
            ));
        }

        if participant.current_status == ParticipantStatus::Present {
            return Err(GatherlyError::AlreadyPresent {
                participant_id: participant.id,
            });
        }

        let participant = self
            .tracker
            .transition(participant.id, ParticipantStatus::Present)
            .await?;
        let user = self.get_user(participant.user_id).await?;

        info!(
            participant_id = participant.id,
            event_id = event.id,
            acting_user_id = acting_user_id,
            "Presence confirmed"
        );

        Ok(PresenceConfirmation {
            participant_id: participant.id,
            user_id: user.id,
            status: participant.current_status,
            user_name: user.name,
            user_email: user.email,
        })
    }

    /// Partition all participants of an event into present and absent
    pub async fn attendance_report(
        &self,
        event_id: i64,
        acting_user_id: i64,
    ) -> Result<AttendanceReport> {
        let event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        let participants = self.participants.find_by_event(event_id).await?;
        let mut present = Vec::new();
        let mut absent = Vec::new();

        for participant in &participants {
            let user = self.get_user(participant.user_id).await?;
            let summary = ParticipantSummary {
                id: participant.id,
                user_id: user.id,
                user_name: user.name,
                user_email: user.email,
                user_photo: user.photo,
                is_collaborator: participant.is_collaborator,
                status: participant.current_status,
            };
            if participant.current_status == ParticipantStatus::Present {
                present.push(summary);
            } else {
                absent.push(summary);
            }
        }

        Ok(AttendanceReport {
            event_name: event.name,
            event_state: event.state,
            total_participants: participants.len(),
            present_count: present.len(),
            absent_count: absent.len(),
            present,
            absent,
        })
    }

    /// Currently-present participants with the instant they were scanned in
    pub async fn present_participants(
        &self,
        event_id: i64,
        acting_user_id: i64,
    ) -> Result<Vec<PresentEntry>> {
        let event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        let participants = self
            .participants
            .find_by_event_and_status(event_id, ParticipantStatus::Present)
            .await?;

        let mut entries = Vec::with_capacity(participants.len());
        for participant in participants {
            let user = self.get_user(participant.user_id).await?;
            entries.push(PresentEntry {
                participant_id: participant.id,
                user_id: user.id,
                user_name: user.name,
                status: participant.current_status,
                scanned_at: participant.status_entered_at(),
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_serializes_status_uppercase() {
        let confirmation = PresenceConfirmation {
            participant_id: 1,
            user_id: 2,
            status: ParticipantStatus::Present,
            user_name: "Ana".to_string(),
            user_email: "ana@example.com".to_string(),
        };
        let json = serde_json::to_value(&confirmation).unwrap();
        assert_eq!(json["status"], "PRESENT");
    }
}
