//! Event repository implementation

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::FromRow;

use crate::database::connection::DatabasePool;
use crate::database::store::EventStore;
use crate::models::{Event, EventState, NewEvent, Visibility};
use crate::utils::errors::Result;

const EVENT_COLUMNS: &str = "id, name, description, location, \
    date_fixed_start, date_fixed_end, time_fixed_start, time_fixed_end, \
    date_start, date_end, time_start, time_end, \
    max_participants, visibility, state, owner_id, invite_token, invite_code";

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: String,
    location: String,
    date_fixed_start: NaiveDate,
    date_fixed_end: NaiveDate,
    time_fixed_start: NaiveTime,
    time_fixed_end: NaiveTime,
    date_start: Option<NaiveDate>,
    date_end: Option<NaiveDate>,
    time_start: Option<NaiveTime>,
    time_end: Option<NaiveTime>,
    max_participants: i32,
    visibility: Visibility,
    state: EventState,
    owner_id: i64,
    invite_token: Option<String>,
    invite_code: Option<String>,
}

impl EventRow {
    fn into_event(self, collaborators: Vec<i64>) -> Event {
        Event {
            id: self.id,
            name: self.name,
            description: self.description,
            location: self.location,
            date_fixed_start: self.date_fixed_start,
            date_fixed_end: self.date_fixed_end,
            time_fixed_start: self.time_fixed_start,
            time_fixed_end: self.time_fixed_end,
            date_start: self.date_start,
            date_end: self.date_end,
            time_start: self.time_start,
            time_end: self.time_end,
            max_participants: self.max_participants,
            visibility: self.visibility,
            state: self.state,
            owner_id: self.owner_id,
            collaborators,
            invite_token: self.invite_token,
            invite_code: self.invite_code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: DatabasePool,
}

impl EventRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn collaborators_for(&self, event_id: i64) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM event_collaborators WHERE event_id = $1 ORDER BY user_id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    async fn hydrate(&self, row: Option<EventRow>) -> Result<Option<Event>> {
        match row {
            Some(row) => {
                let collaborators = self.collaborators_for(row.id).await?;
                Ok(Some(row.into_event(collaborators)))
            }
            None => Ok(None),
        }
    }

    async fn replace_collaborators(&self, event_id: i64, collaborators: &[i64]) -> Result<()> {
        sqlx::query("DELETE FROM event_collaborators WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        for user_id in collaborators {
            sqlx::query("INSERT INTO event_collaborators (event_id, user_id) VALUES ($1, $2)")
                .bind(event_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn get(&self, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_invite_token(&self, token: &str) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE invite_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_invite_code(&self, code: &str) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE invite_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        self.hydrate(row).await
    }

    async fn find_by_states(&self, states: &[EventState]) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE state = ANY($1) ORDER BY id"
        ))
        .bind(states.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let collaborators = self.collaborators_for(row.id).await?;
            events.push(row.into_event(collaborators));
        }
        Ok(events)
    }

    async fn assigned_invite_codes(&self) -> Result<HashSet<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT invite_code FROM events WHERE invite_code IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(code,)| code).collect())
    }

    async fn create(&self, event: NewEvent, state: EventState) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (name, description, location,
                date_fixed_start, date_fixed_end, time_fixed_start, time_fixed_end,
                max_participants, visibility, state, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.name)
        .bind(event.description)
        .bind(event.location)
        .bind(event.date_fixed_start)
        .bind(event.date_fixed_end)
        .bind(event.time_fixed_start)
        .bind(event.time_fixed_end)
        .bind(event.max_participants)
        .bind(event.visibility)
        .bind(state)
        .bind(event.owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_event(Vec::new()))
    }

    async fn save(&self, event: Event) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET name = $2, description = $3, location = $4,
                date_fixed_start = $5, date_fixed_end = $6,
                time_fixed_start = $7, time_fixed_end = $8,
                date_start = $9, date_end = $10, time_start = $11, time_end = $12,
                max_participants = $13, visibility = $14, state = $15,
                owner_id = $16, invite_token = $17, invite_code = $18
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date_fixed_start)
        .bind(event.date_fixed_end)
        .bind(event.time_fixed_start)
        .bind(event.time_fixed_end)
        .bind(event.date_start)
        .bind(event.date_end)
        .bind(event.time_start)
        .bind(event.time_end)
        .bind(event.max_participants)
        .bind(event.visibility)
        .bind(event.state)
        .bind(event.owner_id)
        .bind(&event.invite_token)
        .bind(&event.invite_code)
        .fetch_one(&self.pool)
        .await?;

        self.replace_collaborators(event.id, &event.collaborators).await?;

        Ok(row.into_event(event.collaborators))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
