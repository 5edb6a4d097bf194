use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{SessionError, SessionStore};

#[derive(Debug, Clone)]
struct SessionEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-local session store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<i64, SessionEntry>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, account_id: i64, value: &str, ttl: Duration) -> Result<(), SessionError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(SessionError::TtlOutOfRange)?;
        let entry = SessionEntry {
            value: value.to_string(),
            expires_at,
        };
        self.entries.write().await.insert(account_id, entry);
        Ok(())
    }

    async fn get(&self, account_id: i64) -> Result<Option<String>, SessionError> {
        let entries = self.entries.read().await;
        let now = Utc::now();

        Ok(entries
            .get(&account_id)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired(now));

        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<(), SessionError> {
        Ok(())
    }
}
