use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::password::{CredentialHasher, HashingError, PasswordConfig};
use crate::auth::token::TokenIssuer;
use crate::config::Settings;
use crate::db::{AccountRepository, AccountView};
use crate::error::{AppError, DatabaseError};
use crate::session::SessionStore;

/// Reachability of the service's collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub database: bool,
    pub session_store: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database && self.session_store
    }
}

/// Register, login and identity resolution over injected collaborators.
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    sessions: Arc<dyn SessionStore>,
    hasher: CredentialHasher,
    tokens: TokenIssuer,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionStore>,
        hasher: CredentialHasher,
        tokens: TokenIssuer,
        session_ttl: Duration,
    ) -> Self {
        Self {
            accounts,
            sessions,
            hasher,
            tokens,
            session_ttl,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, AppError> {
        let hasher = CredentialHasher::new(PasswordConfig::from(&settings.auth))
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        let tokens = TokenIssuer::new(
            settings.auth.jwt_secret.as_bytes(),
            Duration::hours(settings.auth.token_expiry_hours),
        );

        Ok(Self::new(
            accounts,
            sessions,
            hasher,
            tokens,
            Duration::hours(settings.session.ttl_hours),
        ))
    }

    /// Creates an account. No token is issued; logging in is a separate step.
    #[instrument(skip_all, fields(username = %username, email = %email))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<i64, AppError> {
        if username.trim().is_empty() {
            return Err(AppError::InvalidInput("username is required".into()));
        }
        if email.trim().is_empty() {
            return Err(AppError::InvalidInput("email is required".into()));
        }
        if password.is_empty() {
            return Err(AppError::InvalidInput("password is required".into()));
        }

        let secret = self.hash(password).await?;

        let id = self
            .accounts
            .insert(username, email, &secret)
            .await
            .map_err(|e| {
                match &e {
                    DatabaseError::Duplicate => info!("Registration conflicts with an existing account"),
                    other => error!("Failed to insert account: {}", other),
                }
                AppError::from(e)
            })?;

        info!(account_id = id, "Account registered");
        Ok(id)
    }

    /// Checks credentials and returns a fresh token.
    ///
    /// Unknown email and wrong password are the same failure, and both run
    /// one password verification.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let account = self.accounts.find_by_email(email).await.map_err(|e| {
            error!("Failed to look up account: {}", e);
            AppError::DependencyFailure(e.to_string())
        })?;

        let (account_id, secret) = match account {
            Some(account) => (Some(account.id), account.password_hash),
            None => (None, self.hasher.dummy_secret().to_owned()),
        };

        let matches = self.verify(password, secret).await?;
        let account_id = match account_id {
            Some(id) if matches => id,
            _ => {
                warn!("Login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(account_id, Utc::now())?;

        // The token is valid on its own; a missing session record only
        // affects the advisory view.
        if let Err(e) = self.sessions.put(account_id, &token, self.session_ttl).await {
            warn!(account_id, "Failed to record session, continuing: {}", e);
        }

        info!(account_id, "Login successful");
        Ok(token)
    }

    /// Maps a token back to the public view of its account.
    #[instrument(skip_all)]
    pub async fn resolve_identity(&self, token: &str) -> Result<AccountView, AppError> {
        let account_id = self.tokens.verify(token, Utc::now()).map_err(|e| {
            debug!("Token rejected: {}", e);
            AppError::from(e)
        })?;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await
            .map_err(|e| {
                error!("Failed to look up account {}: {}", account_id, e);
                AppError::DependencyFailure(e.to_string())
            })?
            .ok_or(AppError::AccountNotFound)?;

        Ok(account.into())
    }

    /// The token most recently issued to `account_id`, if its session is live.
    pub async fn current_session(&self, account_id: i64) -> Result<Option<String>, AppError> {
        Ok(self.sessions.get(account_id).await?)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        Ok(self.sessions.purge_expired().await?)
    }

    pub async fn health(&self) -> HealthReport {
        let (database, session_store) = tokio::join!(self.accounts.ping(), self.sessions.ping());

        if let Err(e) = &database {
            error!("Database health check failed: {}", e);
        }
        if let Err(e) = &session_store {
            error!("Session store health check failed: {}", e);
        }

        HealthReport {
            database: database.is_ok(),
            session_store: session_store.is_ok(),
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        let secret = task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashingError::HashingFailed(e.to_string()))??;
        Ok(secret)
    }

    async fn verify(&self, password: &str, secret: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        task::spawn_blocking(move || hasher.verify(&password, &secret))
            .await
            .map_err(|e| AppError::from(HashingError::HashingFailed(e.to_string())))
    }
}
