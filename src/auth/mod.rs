//! Authentication module
//!
//! Password hashing, token issuance and verification, and the service that
//! composes them with account and session storage.

pub mod handlers;
mod password;
mod service;
mod token;

pub use password::{CredentialHasher, HashingError, PasswordConfig};
pub use service::{AuthService, HealthReport};
pub use token::{Claims, TokenError, TokenIssuer};
