//! Authorization guard
//!
//! Role derivation for a (user, event) pair and the permission checks used
//! by the lifecycle, admission and check-in services. Every call site goes
//! through this guard; the underlying signals (owner id, collaborator list,
//! participant flag) are never re-checked inline elsewhere.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::store::ParticipantStore;
use crate::models::Event;
use crate::utils::errors::{GatherlyError, Result};

/// Role of a user relative to an event, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Collaborator,
    Participant,
    Visitor,
}

#[derive(Clone)]
pub struct AuthorizationGuard {
    participants: Arc<dyn ParticipantStore>,
}

impl AuthorizationGuard {
    pub fn new(participants: Arc<dyn ParticipantStore>) -> Self {
        Self { participants }
    }

    /// Derive the single role of a user for an event
    ///
    /// Priority: owner > collaborator (event list or participant flag) >
    /// participant > visitor.
    pub async fn derive_role(&self, event: &Event, user_id: i64) -> Result<Role> {
        if event.owner_id == user_id {
            return Ok(Role::Owner);
        }

        let row = self
            .participants
            .find_by_event_and_user(event.id, user_id)
            .await?;

        if event.is_collaborator(user_id) || row.as_ref().is_some_and(|p| p.is_collaborator) {
            return Ok(Role::Collaborator);
        }

        if row.is_some() {
            return Ok(Role::Participant);
        }

        Ok(Role::Visitor)
    }

    /// Require the owner or a collaborator
    pub async fn ensure_organizer(&self, event: &Event, user_id: i64) -> Result<()> {
        match self.derive_role(event, user_id).await? {
            Role::Owner | Role::Collaborator => Ok(()),
            role => {
                debug!(
                    event_id = event.id,
                    user_id = user_id,
                    role = ?role,
                    "Organizer check failed"
                );
                Err(GatherlyError::Forbidden(
                    "Only the owner or a collaborator may perform this operation".to_string(),
                ))
            }
        }
    }

    /// Require the owner
    pub async fn ensure_owner(&self, event: &Event, user_id: i64) -> Result<()> {
        if event.owner_id == user_id {
            Ok(())
        } else {
            Err(GatherlyError::Forbidden(
                "Only the owner may perform this operation".to_string(),
            ))
        }
    }

    /// Require the owner, a collaborator, or the target user themself
    pub async fn ensure_organizer_or_self(
        &self,
        event: &Event,
        target_user_id: i64,
        acting_user_id: i64,
    ) -> Result<()> {
        if acting_user_id == target_user_id {
            return Ok(());
        }
        match self.ensure_organizer(event, acting_user_id).await {
            Err(GatherlyError::Forbidden(_)) => Err(GatherlyError::Forbidden(
                "Only the owner, a collaborator or the participant themself may perform this operation"
                    .to_string(),
            )),
            other => other,
        }
    }
}
