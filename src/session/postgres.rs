use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use super::{SessionError, SessionStore};

/// Session store backed by the `user_sessions` table.
pub struct PgSessionStore {
    pool: Arc<PgPool>,
}

impl PgSessionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn put(&self, account_id: i64, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(SessionError::TtlOutOfRange)?;

        sqlx::query(
            r#"
            INSERT INTO user_sessions (user_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id)
            DO UPDATE SET token = EXCLUDED.token,
                          expires_at = EXCLUDED.expires_at,
                          created_at = EXCLUDED.created_at
            "#,
        )
        .bind(account_id)
        .bind(value)
        .bind(expires_at)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn get(&self, account_id: i64) -> Result<Option<String>, SessionError> {
        let token = sqlx::query_scalar::<_, String>(
            "SELECT token FROM user_sessions WHERE user_id = $1 AND expires_at > $2",
        )
        .bind(account_id)
        .bind(Utc::now())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(token)
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), SessionError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
