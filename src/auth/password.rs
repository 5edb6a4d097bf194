//! Password hashing and verification using Argon2id.
//!
//! Secrets are stored in PHC string format, which embeds the algorithm,
//! cost parameters and the per-call random salt next to the digest, so
//! verification never needs anything but the plaintext and the stored string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;
use tracing::warn;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum HashingError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    /// OWASP baseline for Argon2id: 19 MiB, two passes, one lane.
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&AuthConfig> for PasswordConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            memory_kib: config.hash_memory_kib,
            iterations: config.hash_iterations,
            parallelism: config.hash_parallelism,
        }
    }
}

/// One-way password transform with constant-time verification.
///
/// Cloning is cheap; clones are moved onto the blocking pool.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    /// Secret of a password nobody knows, verified against when the account
    /// does not exist so both login failure paths cost the same.
    dummy_secret: String,
}

impl CredentialHasher {
    pub fn new(config: PasswordConfig) -> Result<Self, HashingError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| HashingError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            dummy_secret: String::new(),
        };
        hasher.dummy_secret = hasher.hash("dummy password for unknown accounts")?;
        Ok(hasher)
    }

    /// Hashes `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashingError::HashingFailed(e.to_string()))
    }

    /// Checks `plaintext` against a stored secret.
    ///
    /// Uses the parameters embedded in `secret`, not the configured ones, so
    /// secrets created under older cost settings keep verifying. An
    /// unparsable secret is a mismatch.
    pub fn verify(&self, plaintext: &str, secret: &str) -> bool {
        let parsed = match PasswordHash::new(secret) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password secret could not be parsed: {}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }

    pub fn dummy_secret(&self) -> &str {
        &self.dummy_secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let secret = hasher.hash("pw123").unwrap();

        assert!(secret.starts_with("$argon2id$"));
        assert!(!secret.contains("pw123"));
        assert!(hasher.verify("pw123", &secret));
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let hasher = hasher();
        let secret = hasher.hash("correct horse").unwrap();

        assert!(!hasher.verify("correct hors", &secret));
        assert!(!hasher.verify("correct horse ", &secret));
        assert!(!hasher.verify("", &secret));
    }

    #[test]
    fn test_same_password_gets_distinct_secrets() {
        let hasher = hasher();
        let first = hasher.hash("same").unwrap();
        let second = hasher.hash("same").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("same", &first));
        assert!(hasher.verify("same", &second));
    }

    #[test]
    fn test_garbage_secret_is_a_mismatch() {
        let hasher = hasher();
        assert!(!hasher.verify("pw", "not-a-phc-string"));
        assert!(!hasher.verify("pw", ""));
    }

    #[test]
    fn test_verify_uses_parameters_from_secret() {
        let old = hasher();
        let secret = old.hash("pw").unwrap();

        let new = CredentialHasher::new(PasswordConfig {
            memory_kib: 2048,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(new.verify("pw", &secret));
    }

    #[test]
    fn test_dummy_secret_matches_no_user_input() {
        let hasher = hasher();
        assert!(hasher.dummy_secret().starts_with("$argon2id$"));
        assert!(!hasher.verify("", hasher.dummy_secret()));
    }

    #[test]
    fn test_invalid_params() {
        let result = CredentialHasher::new(PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(HashingError::InvalidParams(_))));
    }
}
