//! Participant repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::database::connection::DatabasePool;
use crate::database::store::ParticipantStore;
use crate::models::{NewParticipant, Participant, ParticipantStatus, StatusChange};
use crate::utils::errors::Result;

const PARTICIPANT_COLUMNS: &str =
    "id, event_id, user_id, current_status, is_collaborator, attendance_token";

#[derive(Debug, FromRow)]
struct ParticipantRow {
    id: i64,
    event_id: i64,
    user_id: i64,
    current_status: ParticipantStatus,
    is_collaborator: bool,
    attendance_token: Option<String>,
}

impl ParticipantRow {
    fn into_participant(self, history: Vec<StatusChange>) -> Participant {
        Participant {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            current_status: self.current_status,
            is_collaborator: self.is_collaborator,
            attendance_token: self.attendance_token,
            history,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: DatabasePool,
}

impl ParticipantRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn history_for(&self, participant_id: i64) -> Result<Vec<StatusChange>> {
        let history = sqlx::query_as::<_, StatusChange>(
            "SELECT id, participant_id, status, changed_at FROM participant_history \
             WHERE participant_id = $1 ORDER BY id",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    async fn hydrate(&self, row: Option<ParticipantRow>) -> Result<Option<Participant>> {
        match row {
            Some(row) => {
                let history = self.history_for(row.id).await?;
                Ok(Some(row.into_participant(history)))
            }
            None => Ok(None),
        }
    }

    async fn hydrate_all(&self, rows: Vec<ParticipantRow>) -> Result<Vec<Participant>> {
        let mut participants = Vec::with_capacity(rows.len());
        for row in rows {
            let history = self.history_for(row.id).await?;
            participants.push(row.into_participant(history));
        }
        Ok(participants)
    }
}

#[async_trait]
impl ParticipantStore for ParticipantRepository {
    async fn get(&self, id: i64) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_event_and_user(
        &self,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_event(&self, event_id: i64) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_all(rows).await
    }

    async fn find_by_event_and_status(
        &self,
        event_id: i64,
        status: ParticipantStatus,
    ) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants \
             WHERE event_id = $1 AND current_status = $2 ORDER BY id"
        ))
        .bind(event_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_all(rows).await
    }

    async fn find_by_attendance_token(&self, token: &str) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE attendance_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn create(&self, participant: NewParticipant) -> Result<Participant> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r#"
            INSERT INTO participants (event_id, user_id, current_status, is_collaborator)
            VALUES ($1, $2, $3, $4)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(participant.event_id)
        .bind(participant.user_id)
        .bind(participant.status)
        .bind(participant.is_collaborator)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_participant(Vec::new()))
    }

    async fn save(&self, participant: Participant) -> Result<Participant> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r#"
            UPDATE participants
            SET current_status = $2, is_collaborator = $3, attendance_token = $4
            WHERE id = $1
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(participant.id)
        .bind(participant.current_status)
        .bind(participant.is_collaborator)
        .bind(&participant.attendance_token)
        .fetch_one(&self.pool)
        .await?;

        let history = self.history_for(row.id).await?;
        Ok(row.into_participant(history))
    }

    async fn append_history(
        &self,
        participant_id: i64,
        status: ParticipantStatus,
        changed_at: DateTime<Utc>,
    ) -> Result<StatusChange> {
        let change = sqlx::query_as::<_, StatusChange>(
            r#"
            INSERT INTO participant_history (participant_id, status, changed_at)
            VALUES ($1, $2, $3)
            RETURNING id, participant_id, status, changed_at
            "#,
        )
        .bind(participant_id)
        .bind(status)
        .bind(changed_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(change)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM participants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
