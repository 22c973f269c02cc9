//! HS256 bearer-token validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use warden_auth::{CredentialError, CredentialValidator, ValidatedCredential, validate_claims};

/// Verifies the HS256 signature, then checks the time window against the
/// supplied `now`.
pub struct Hs256CredentialValidator {
    key: DecodingKey,
    validation: Validation,
    leeway: Duration,
}

impl Hs256CredentialValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `validate_claims` with the caller's clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
            leeway: Duration::zero(),
        }
    }

    /// Tolerated clock skew on `iat` and `exp`.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

impl CredentialValidator for Hs256CredentialValidator {
    fn validate(&self, raw_token: &str, now: DateTime<Utc>) -> Result<ValidatedCredential, CredentialError> {
        let data = jsonwebtoken::decode::<ValidatedCredential>(raw_token, &self.key, &self.validation)
            .map_err(|e| CredentialError::InvalidToken(e.to_string()))?;
        validate_claims(&data.claims, now, self.leeway)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};

    use warden_core::UserId;

    use super::*;

    fn mint(secret: &str, claims: &ValidatedCredential) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(now: DateTime<Utc>) -> ValidatedCredential {
        ValidatedCredential {
            sub: UserId::new(),
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn accepts_a_well_signed_current_token() {
        let now = Utc::now();
        let expected = claims(now);
        let validator = Hs256CredentialValidator::new("secret");

        let got = validator.validate(&mint("secret", &expected), now).unwrap();
        assert_eq!(got.sub, expected.sub);
    }

    #[test]
    fn rejects_a_foreign_signature() {
        let now = Utc::now();
        let validator = Hs256CredentialValidator::new("secret");

        let err = validator.validate(&mint("other", &claims(now)), now).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidToken(_)));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let now = Utc::now();
        let validator = Hs256CredentialValidator::new("secret");
        let token = mint("secret", &claims(now));

        let err = validator.validate(&token, now + Duration::hours(1)).unwrap_err();
        assert_eq!(err, CredentialError::ExpiredToken);
    }

    #[test]
    fn leeway_admits_a_token_from_a_fast_issuer_clock() {
        let now = Utc::now();
        let ahead = ValidatedCredential {
            sub: UserId::new(),
            issued_at: now + Duration::seconds(2),
            expires_at: now + Duration::minutes(10),
        };
        let token = mint("secret", &ahead);

        let strict = Hs256CredentialValidator::new("secret");
        assert!(matches!(strict.validate(&token, now), Err(CredentialError::InvalidToken(_))));

        let lenient = Hs256CredentialValidator::new("secret").with_leeway(Duration::seconds(60));
        assert_eq!(lenient.validate(&token, now).unwrap().sub, ahead.sub);
    }

    #[test]
    fn garbage_is_invalid() {
        let validator = Hs256CredentialValidator::new("secret");
        assert!(matches!(
            validator.validate("not-a-jwt", Utc::now()),
            Err(CredentialError::InvalidToken(_))
        ));
    }
}
