//! Signed bearer tokens (HS256 JWT).
//!
//! Verification is ordered: segment count, signature, then expiry against the
//! caller's clock, then claim shape. A three-segment forgery is therefore always
//! reported as `BadSignature`, never as `Expired` or `Malformed`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{crypto, decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,

    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Account ID
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

/// Claims as read back from a token whose signature checked out. Nothing is
/// required at the serde level so missing claims surface as `Malformed`
/// after the expiry check, not as a decoding failure.
#[derive(Debug, Deserialize)]
struct UncheckedClaims {
    sub: Option<String>,
    exp: Option<i64>,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], lifetime: Duration) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the caller-supplied clock instead.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        }
    }

    /// Issues a token for `subject_id` that expires `lifetime` after `now`.
    pub fn issue(&self, subject_id: i64, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| TokenError::Encoding("expiry out of range".into()))?;
        let claims = Claims {
            sub: subject_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Returns the subject of `token` if it is authentic and unexpired at `now`.
    ///
    /// A token is valid while `now < exp`, at one-second granularity.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<i64, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }
        let (message, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;

        // An undecodable signature segment is as untrustworthy as a wrong one.
        let authentic = crypto::verify(signature, message.as_bytes(), &self.decoding_key, ALGORITHM)
            .unwrap_or(false);
        if !authentic {
            return Err(TokenError::BadSignature);
        }

        let claims = decode::<UncheckedClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
                _ => TokenError::Malformed,
            })?
            .claims;

        let exp = claims.exp.ok_or(TokenError::Malformed)?;
        if now.timestamp() >= exp {
            return Err(TokenError::Expired);
        }

        claims
            .sub
            .and_then(|sub| sub.parse::<i64>().ok())
            .ok_or(TokenError::Malformed)
    }
}
