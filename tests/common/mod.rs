#![allow(dead_code)]

use async_trait::async_trait;
use auth_service::error::DatabaseError;
use auth_service::session::SessionError;
use auth_service::{
    Account, AccountRepository, AuthService, CredentialHasher, MemorySessionStore, PasswordConfig,
    SessionStore, TokenIssuer,
};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SECRET: &[u8] = b"integration-secret-0123456789abcdef";

/// Account repository with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct InMemoryAccounts {
    accounts: Mutex<Vec<Account>>,
    offline: AtomicBool,
}

impl InMemoryAccounts {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn remove(&self, id: i64) {
        self.accounts.lock().await.retain(|account| account.id != id);
    }

    pub async fn count(&self) -> usize {
        self.accounts.lock().await.len()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), DatabaseError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DatabaseError::ConnectionError("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccounts {
    async fn insert(&self, username: &str, email: &str, secret: &str) -> Result<i64, DatabaseError> {
        self.check_online()?;
        let mut accounts = self.accounts.lock().await;

        if accounts
            .iter()
            .any(|account| account.username == username || account.email == email)
        {
            return Err(DatabaseError::Duplicate);
        }

        let id = accounts.iter().map(|account| account.id).max().unwrap_or(0) + 1;
        accounts.push(Account {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: secret.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        self.check_online()?;
        let accounts = self.accounts.lock().await;
        Ok(accounts.iter().find(|account| account.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, DatabaseError> {
        self.check_online()?;
        let accounts = self.accounts.lock().await;
        Ok(accounts.iter().find(|account| account.id == id).cloned())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check_online()
    }
}

/// Session store that is never reachable.
pub struct UnreachableSessionStore;

#[async_trait]
impl SessionStore for UnreachableSessionStore {
    async fn put(&self, _account_id: i64, _value: &str, _ttl: Duration) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _account_id: i64) -> Result<Option<String>, SessionError> {
        Err(SessionError::Unavailable("connection refused".into()))
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        Err(SessionError::Unavailable("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("connection refused".into()))
    }
}

pub fn fast_hasher() -> CredentialHasher {
    CredentialHasher::new(PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("Failed to build hasher")
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::hours(24))
}

pub fn service_with(
    accounts: Arc<InMemoryAccounts>,
    sessions: Arc<dyn SessionStore>,
    hasher: CredentialHasher,
) -> AuthService {
    AuthService::new(accounts, sessions, hasher, issuer(), Duration::hours(24))
}

pub fn test_service() -> (AuthService, Arc<InMemoryAccounts>, MemorySessionStore) {
    let accounts = InMemoryAccounts::new();
    let sessions = MemorySessionStore::new();
    let service = service_with(accounts.clone(), Arc::new(sessions.clone()), fast_hasher());
    (service, accounts, sessions)
}
