use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::UserId;

/// Claims of a credential whose signature has already been verified.
///
/// Only the subject is trusted for identity; roles and the active flag are
/// always re-read from the user store by the identity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedCredential {
    /// Subject / account identifier.
    pub sub: UserId,

    /// Issued-at timestamp (`iat`).
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp (`exp`).
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Failure of the credential validator collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token has expired")]
    ExpiredToken,
}

impl From<TokenValidationError> for CredentialError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => CredentialError::ExpiredToken,
            other => CredentialError::InvalidToken(other.to_string()),
        }
    }
}

/// Turns a raw bearer token into validated claims.
///
/// Signature verification lives in the implementation (see the API crate's
/// HS256 validator); this crate only checks the time window.
pub trait CredentialValidator: Send + Sync {
    fn validate(&self, raw_token: &str, now: DateTime<Utc>) -> Result<ValidatedCredential, CredentialError>;
}

/// Deterministically validate credential time claims.
///
/// `leeway` absorbs clock skew between the issuer and this process: a token
/// stamped up to `leeway` in the future is accepted, and one stays usable
/// for `leeway` past its expiry.
pub fn validate_claims(
    claims: &ValidatedCredential,
    now: DateTime<Utc>,
    leeway: Duration,
) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now + leeway < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at + leeway {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skew() -> Duration {
        Duration::seconds(30)
    }

    fn credential(issued_offset: i64, ttl: i64) -> (ValidatedCredential, DateTime<Utc>) {
        let now = Utc::now();
        let issued_at = now + Duration::seconds(issued_offset);
        (
            ValidatedCredential {
                sub: UserId::new(),
                issued_at,
                expires_at: issued_at + Duration::seconds(ttl),
            },
            now,
        )
    }

    #[test]
    fn fresh_credential_is_valid() {
        let (claims, now) = credential(-10, 600);
        assert_eq!(validate_claims(&claims, now, skew()), Ok(()));
    }

    #[test]
    fn expired_credential_maps_to_expired_token() {
        let (claims, now) = credential(-600, 60);
        let err = validate_claims(&claims, now, skew()).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
        assert_eq!(CredentialError::from(err), CredentialError::ExpiredToken);
    }

    #[test]
    fn future_and_inverted_windows_are_invalid_tokens() {
        let (claims, now) = credential(120, 600);
        assert!(matches!(
            validate_claims(&claims, now, skew()).map_err(CredentialError::from),
            Err(CredentialError::InvalidToken(_))
        ));

        let (claims, now) = credential(-10, 0);
        assert_eq!(validate_claims(&claims, now, skew()), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn issuer_clock_slightly_ahead_is_tolerated() {
        let (claims, now) = credential(1, 600);
        assert_eq!(validate_claims(&claims, now, skew()), Ok(()));
        assert_eq!(
            validate_claims(&claims, now, Duration::zero()),
            Err(TokenValidationError::NotYetValid)
        );

        let (claims, now) = credential(31, 600);
        assert_eq!(validate_claims(&claims, now, skew()), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn expiry_is_extended_by_the_leeway_only() {
        let (claims, now) = credential(-100, 90);
        assert_eq!(validate_claims(&claims, now, skew()), Ok(()));
        assert_eq!(
            validate_claims(&claims, now, Duration::zero()),
            Err(TokenValidationError::Expired)
        );

        let (claims, now) = credential(-100, 70);
        assert_eq!(validate_claims(&claims, now, skew()), Err(TokenValidationError::Expired));
    }
}
