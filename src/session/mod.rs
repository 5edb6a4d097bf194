//! Session records: the most recent token handed out to each account.
//!
//! Sessions are soft state. They are written on login and expire on their
//! own; authorization never depends on them.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

pub use memory::MemorySessionStore;
pub use postgres::PgSessionStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Session lifetime out of range")]
    TtlOutOfRange,
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        SessionError::Unavailable(err.to_string())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `value` for `account_id`, replacing any previous one.
    async fn put(&self, account_id: i64, value: &str, ttl: Duration) -> Result<(), SessionError>;

    /// Returns the live value for `account_id`, if any.
    async fn get(&self, account_id: i64) -> Result<Option<String>, SessionError>;

    /// Drops expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionError>;

    async fn ping(&self) -> Result<(), SessionError>;
}
