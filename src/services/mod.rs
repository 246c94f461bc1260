//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod checkin;
pub mod event;
pub mod participant;
pub mod qr;
pub mod status;

// Re-export commonly used services
pub use auth::{AuthorizationGuard, Role};
pub use checkin::{
    AttendancePass, AttendanceReport, CheckinService, ParticipantSummary, PresenceConfirmation,
    PresentEntry,
};
pub use event::EventService;
pub use participant::ParticipantService;
pub use qr::{QrEncoder, SvgQrEncoder};
pub use status::StatusTracker;

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::store::{EventStore, ParticipantStore, UserStore};
use crate::utils::clock::Clock;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub participant_service: ParticipantService,
    pub checkin_service: CheckinService,
    pub status_tracker: StatusTracker,
    pub authorization: AuthorizationGuard,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        settings: Settings,
        users: Arc<dyn UserStore>,
        events: Arc<dyn EventStore>,
        participants: Arc<dyn ParticipantStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let status_tracker = StatusTracker::new(participants.clone(), clock.clone());
        let authorization = AuthorizationGuard::new(participants.clone());
        let encoder: Arc<dyn QrEncoder> = Arc::new(SvgQrEncoder::new(300));

        let event_service = EventService::new(
            events.clone(),
            users.clone(),
            participants.clone(),
            status_tracker.clone(),
            authorization.clone(),
            clock.clone(),
            &settings.lifecycle,
        )?;
        let participant_service = ParticipantService::new(
            events.clone(),
            users.clone(),
            participants.clone(),
            status_tracker.clone(),
            authorization.clone(),
        );
        let checkin_service = CheckinService::new(
            events,
            users,
            participants,
            status_tracker.clone(),
            authorization.clone(),
            encoder,
        );

        Ok(Self {
            event_service,
            participant_service,
            checkin_service,
            status_tracker,
            authorization,
        })
    }
}
