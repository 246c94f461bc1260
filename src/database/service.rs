//! Database service layer
//!
//! Bundles the Postgres repositories behind the store contracts so callers
//! wire services against trait objects, never against sqlx directly.

use std::sync::Arc;

use crate::database::connection::DatabasePool;
use crate::database::repositories::{EventRepository, ParticipantRepository, UserRepository};
use crate::database::store::{EventStore, ParticipantStore, UserStore};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub events: EventRepository,
    pub participants: ParticipantRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool),
        }
    }

    pub fn user_store(&self) -> Arc<dyn UserStore> {
        Arc::new(self.users.clone())
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        Arc::new(self.events.clone())
    }

    pub fn participant_store(&self) -> Arc<dyn ParticipantStore> {
        Arc::new(self.participants.clone())
    }
}
