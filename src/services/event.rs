//! Event lifecycle service
//!
//! Owns the event state machine: manual start/finish/cancel transitions,
//! the periodic sweep that advances events on wall-clock time, and invite
//! token/code issuance. Every schedule comparison happens in the configured
//! canonical time zone.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDateTime};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::LifecycleConfig;
use crate::database::store::{EventStore, ParticipantStore, UserStore};
use crate::models::{
    Event, EventState, EventUpdate, Invite, NewEvent, NewParticipant, ParticipantStatus,
};
use crate::services::auth::AuthorizationGuard;
use crate::services::status::StatusTracker;
use crate::utils::clock::Clock;
use crate::utils::errors::{GatherlyError, Result};
use crate::utils::{codes, logging};

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    participants: Arc<dyn ParticipantStore>,
    tracker: StatusTracker,
    guard: AuthorizationGuard,
    clock: Arc<dyn Clock>,
    zone: FixedOffset,
    sweep_interval_secs: u64,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventStore>,
        users: Arc<dyn UserStore>,
        participants: Arc<dyn ParticipantStore>,
        tracker: StatusTracker,
        guard: AuthorizationGuard,
        clock: Arc<dyn Clock>,
        config: &LifecycleConfig,
    ) -> Result<Self> {
        let zone = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            GatherlyError::Config(format!(
                "Invalid UTC offset: {} minutes",
                config.utc_offset_minutes
            ))
        })?;

        Ok(Self {
            events,
            users,
            participants,
            tracker,
            guard,
            clock,
            zone,
            sweep_interval_secs: config.sweep_interval_secs,
        })
    }

    /// Current instant in the canonical time zone
    fn local_now(&self) -> NaiveDateTime {
        self.clock.now().with_timezone(&self.zone).naive_local()
    }

    fn validate_schedule(start: NaiveDateTime, end: NaiveDateTime) -> Result<()> {
        if end <= start {
            return Err(GatherlyError::Validation(
                "Fixed end must be after fixed start".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .get(event_id)
            .await?
            .ok_or(GatherlyError::EventNotFound { event_id })
    }

    /// Create an event in `Created` state with the owner as its first
    /// participant, already confirmed
    pub async fn create_event(&self, request: NewEvent) -> Result<Event> {
        Self::validate_schedule(
            request.date_fixed_start.and_time(request.time_fixed_start),
            request.date_fixed_end.and_time(request.time_fixed_end),
        )?;

        let owner_id = request.owner_id;
        self.users
            .get(owner_id)
            .await?
            .ok_or(GatherlyError::UserNotFound { user_id: owner_id })?;

        let event = self.events.create(request, EventState::Created).await?;

        let owner_row = self
            .participants
            .create(NewParticipant {
                event_id: event.id,
                user_id: owner_id,
                status: ParticipantStatus::Confirmed,
                is_collaborator: false,
            })
            .await?;
        self.tracker.record_initial(&owner_row).await?;

        info!(event_id = event.id, owner_id = owner_id, "Event created");
        Ok(event)
    }

    /// Update event fields; only legal while the event is still `Created`,
    /// so the fixed schedule is immutable once the event has started
    pub async fn update_event(
        &self,
        event_id: i64,
        update: EventUpdate,
        acting_user_id: i64,
    ) -> Result<Event> {
        let mut event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if event.state != EventState::Created {
            return Err(GatherlyError::InvalidState {
                event_id,
                state: event.state.to_string(),
            });
        }

        if let Some(name) = update.name {
            event.name = name;
        }
        if let Some(description) = update.description {
            event.description = description;
        }
        if let Some(location) = update.location {
            event.location = location;
        }
        if let Some(date) = update.date_fixed_start {
            event.date_fixed_start = date;
        }
        if let Some(date) = update.date_fixed_end {
            event.date_fixed_end = date;
        }
        if let Some(time) = update.time_fixed_start {
            event.time_fixed_start = time;
        }
        if let Some(time) = update.time_fixed_end {
            event.time_fixed_end = time;
        }
        if let Some(max) = update.max_participants {
            event.max_participants = max;
        }
        if let Some(visibility) = update.visibility {
            event.visibility = visibility;
        }
        if let Some(new_owner_id) = update.owner_id {
            if new_owner_id != event.owner_id {
                self.users
                    .get(new_owner_id)
                    .await?
                    .ok_or(GatherlyError::UserNotFound {
                        user_id: new_owner_id,
                    })?;
                event.owner_id = new_owner_id;
            }
        }

        Self::validate_schedule(event.fixed_starts_at(), event.fixed_ends_at())?;

        let event = self.events.save(event).await?;
        logging::log_event_action(event_id, "update", Some(acting_user_id), None);
        Ok(event)
    }

    /// Delete an event, cascading to participants and their history
    pub async fn delete_event(&self, event_id: i64, acting_user_id: i64) -> Result<()> {
        let event = self.get_event(event_id).await?;
        self.guard.ensure_owner(&event, acting_user_id).await?;

        self.events.delete(event_id).await?;
        info!(event_id = event_id, user_id = acting_user_id, "Event deleted");
        Ok(())
    }

    /// Manually start an event
    ///
    /// Legal only from `Created`. Stamps the actual start to now. As a side
    /// effect the owner's participant row is marked present; a failure in
    /// that bookkeeping is logged and never fails the start itself.
    pub async fn start_event(&self, event_id: i64, acting_user_id: i64) -> Result<Event> {
        let mut event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if event.state != EventState::Created {
            return Err(GatherlyError::InvalidState {
                event_id,
                state: event.state.to_string(),
            });
        }

        let now = self.local_now();
        event.state = EventState::Active;
        event.date_start = Some(now.date());
        event.time_start = Some(now.time());
        let event = self.events.save(event).await?;

        if let Err(e) = self.mark_owner_present(&event).await {
            warn!(
                event_id = event.id,
                owner_id = event.owner_id,
                error = %e,
                "Failed to mark owner present on start"
            );
        }

        logging::log_event_action(event_id, "start", Some(acting_user_id), None);
        Ok(event)
    }

    async fn mark_owner_present(&self, event: &Event) -> Result<()> {
        let owner_row = self
            .participants
            .find_by_event_and_user(event.id, event.owner_id)
            .await?;
        if let Some(participant) = owner_row {
            if participant.current_status != ParticipantStatus::Present {
                self.tracker
                    .transition(participant.id, ParticipantStatus::Present)
                    .await?;
            }
        }
        Ok(())
    }

    /// Manually finish an event; legal only from `Active`
    pub async fn finish_event(&self, event_id: i64, acting_user_id: i64) -> Result<Event> {
        let mut event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if event.state != EventState::Active {
            return Err(GatherlyError::InvalidState {
                event_id,
                state: event.state.to_string(),
            });
        }

        let now = self.local_now();
        event.state = EventState::Finished;
        event.date_end = Some(now.date());
        event.time_end = Some(now.time());
        let event = self.events.save(event).await?;

        logging::log_event_action(event_id, "finish", Some(acting_user_id), None);
        Ok(event)
    }

    /// Cancel an event; legal from `Created` or `Active` only
    pub async fn cancel_event(&self, event_id: i64, acting_user_id: i64) -> Result<Event> {
        let mut event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if event.state.is_terminal() {
            return Err(GatherlyError::InvalidState {
                event_id,
                state: event.state.to_string(),
            });
        }

        event.state = EventState::Canceled;
        let event = self.events.save(event).await?;

        logging::log_event_action(event_id, "cancel", Some(acting_user_id), None);
        Ok(event)
    }

    /// Issue (or return the existing) invite token and code for an event
    pub async fn generate_invite(&self, event_id: i64, acting_user_id: i64) -> Result<Invite> {
        let mut event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if let (Some(token), Some(code)) = (&event.invite_token, &event.invite_code) {
            return Ok(Invite {
                event_id,
                token: token.clone(),
                code: code.clone(),
            });
        }

        let token = match &event.invite_token {
            Some(token) => token.clone(),
            None => {
                let token = codes::generate_invite_token();
                event.invite_token = Some(token.clone());
                token
            }
        };
        let code = match &event.invite_code {
            Some(code) => code.clone(),
            None => {
                let existing = self.events.assigned_invite_codes().await?;
                let code = codes::generate_invite_code(&existing)?;
                event.invite_code = Some(code.clone());
                code
            }
        };

        self.events.save(event).await?;
        info!(event_id = event_id, user_id = acting_user_id, "Invite generated");
        Ok(Invite { event_id, token, code })
    }

    /// Ensure the event has an invite code, generating one when absent
    pub async fn ensure_invite_code(&self, event_id: i64, acting_user_id: i64) -> Result<String> {
        let mut event = self.get_event(event_id).await?;
        self.guard.ensure_organizer(&event, acting_user_id).await?;

        if let Some(code) = &event.invite_code {
            return Ok(code.clone());
        }

        let existing = self.events.assigned_invite_codes().await?;
        let code = codes::generate_invite_code(&existing)?;
        event.invite_code = Some(code.clone());
        self.events.save(event).await?;

        info!(event_id = event_id, "Invite code generated");
        Ok(code)
    }

    /// Resolve an invite token to its event; canceled events reject invites
    pub async fn resolve_invite_token(&self, token: &str) -> Result<Event> {
        let event = self
            .events
            .find_by_invite_token(token)
            .await?
            .ok_or(GatherlyError::InviteNotFound)?;

        if event.state == EventState::Canceled {
            return Err(GatherlyError::NotAdmitting {
                event_id: event.id,
                state: event.state.to_string(),
            });
        }

        Ok(event)
    }

    /// Resolve an invite code to its event
    ///
    /// Validates the 8-character format before touching the store; canceled
    /// and finished events reject the code.
    pub async fn resolve_invite_code(&self, code: &str) -> Result<Event> {
        if !codes::is_valid_code_format(code) {
            return Err(GatherlyError::Validation(
                "Invite code must be 8 characters, uppercase letters and digits only".to_string(),
            ));
        }

        let event = self
            .events
            .find_by_invite_code(code)
            .await?
            .ok_or(GatherlyError::InviteNotFound)?;

        if event.state == EventState::Canceled || event.state == EventState::Finished {
            return Err(GatherlyError::NotAdmitting {
                event_id: event.id,
                state: event.state.to_string(),
            });
        }

        Ok(event)
    }

    /// Advance events whose fixed window has been reached
    ///
    /// `Created` events whose fixed start is due become `Active`; `Active`
    /// events whose fixed end is due become `Finished`. Actual stamps are
    /// only written when unset, so re-running is idempotent. A failure on
    /// one event never aborts the remaining scan.
    pub async fn sweep(&self) -> Result<()> {
        let now = self.local_now();
        let events = self
            .events
            .find_by_states(&[EventState::Created, EventState::Active])
            .await?;

        debug!(count = events.len(), now = %now, "Lifecycle sweep");

        for event in events {
            let event_id = event.id;
            if let Err(e) = self.sweep_event(event, now).await {
                error!(event_id = event_id, error = %e, "Sweep failed for event");
            }
        }

        Ok(())
    }

    async fn sweep_event(&self, mut event: Event, now: NaiveDateTime) -> Result<()> {
        match event.state {
            EventState::Created if event.fixed_starts_at() <= now => {
                event.state = EventState::Active;
                if event.date_start.is_none() {
                    event.date_start = Some(now.date());
                    event.time_start = Some(now.time());
                }
                info!(event_id = event.id, "Event auto-started");
                self.events.save(event).await?;
            }
            EventState::Active if event.fixed_ends_at() <= now => {
                event.state = EventState::Finished;
                if event.date_end.is_none() {
                    event.date_end = Some(now.date());
                    event.time_end = Some(now.time());
                }
                info!(event_id = event.id, "Event auto-finished");
                self.events.save(event).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Spawn the periodic sweep loop on the runtime
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let service = self.clone();
        let interval = std::time::Duration::from_secs(self.sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = service.sweep().await {
                    error!(error = %e, "Lifecycle sweep failed");
                }
            }
        })
    }
}
