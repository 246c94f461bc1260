//! User repository implementation

use async_trait::async_trait;
use chrono::Utc;

use crate::database::connection::DatabasePool;
use crate::database::store::UserStore;
use crate::models::{CreateUserRequest, User};
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: DatabasePool,
}

impl UserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, username, email, photo, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, username, email, photo, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, username, email, photo, created_at
            "#,
        )
        .bind(request.name)
        .bind(request.username)
        .bind(request.email)
        .bind(request.photo)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
