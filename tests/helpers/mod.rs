//! Shared test fixtures
//!
//! Wires the service factory against the in-memory store with a manually
//! controlled clock. Tests run with a zero UTC offset unless stated.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use gatherly::config::Settings;
use gatherly::database::store::UserStore;
use gatherly::database::MemoryStore;
use gatherly::models::{CreateUserRequest, Event, NewEvent, User, Visibility};
use gatherly::services::ServiceFactory;
use gatherly::utils::clock::ManualClock;

/// 2025-06-01 08:00 UTC, two hours before the default event window
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub services: ServiceFactory,
}

pub fn setup() -> TestContext {
    setup_with_offset(0)
}

pub fn setup_with_offset(utc_offset_minutes: i32) -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(test_epoch()));

    let mut settings = Settings::default();
    settings.lifecycle.utc_offset_minutes = utc_offset_minutes;

    let services = ServiceFactory::new(
        settings,
        store.clone(),
        store.clone(),
        store.clone(),
        clock.clone(),
    )
    .expect("service factory");

    TestContext {
        store,
        clock,
        services,
    }
}

impl TestContext {
    pub async fn create_user(&self, name: &str) -> User {
        UserStore::create(
            self.store.as_ref(),
            CreateUserRequest {
                name: name.to_string(),
                username: Some(name.to_lowercase()),
                email: format!("{}@example.com", name.to_lowercase()),
                photo: None,
            },
        )
        .await
        .expect("create user")
    }

    /// Event owned by `owner` with a fixed window of [10:00, 11:00] on the
    /// epoch day
    pub async fn create_event(&self, owner: &User, visibility: Visibility) -> Event {
        self.create_event_with_window(owner, visibility, (10, 0), (11, 0))
            .await
    }

    pub async fn create_event_with_window(
        &self,
        owner: &User,
        visibility: Visibility,
        start: (u32, u32),
        end: (u32, u32),
    ) -> Event {
        self.services
            .event_service
            .create_event(NewEvent {
                name: "Team offsite".to_string(),
                description: "Annual planning offsite".to_string(),
                location: "Conference center".to_string(),
                date_fixed_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                date_fixed_end: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                time_fixed_start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
                time_fixed_end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
                max_participants: 100,
                visibility,
                owner_id: owner.id,
            })
            .await
            .expect("create event")
    }

    /// Start an event through the owner and return it active
    pub async fn start_event(&self, event: &Event) -> Event {
        self.services
            .event_service
            .start_event(event.id, event.owner_id)
            .await
            .expect("start event")
    }

    pub async fn reload_event(&self, event_id: i64) -> Event {
        self.services
            .event_service
            .get_event(event_id)
            .await
            .expect("reload event")
    }
}
