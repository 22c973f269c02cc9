//! Password hashing port and the Argon2id implementation.

use argon2::password_hash::{PasswordHash as PhcString, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use thiserror::Error;

/// A PHC-formatted password hash. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an already-computed PHC string (e.g. loaded from storage).
    pub fn from_phc(phc: impl Into<String>) -> Self {
        Self(phc.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordHashError {
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("hashing failed: {0}")]
    Hashing(String),

    #[error("invalid hasher parameters: {0}")]
    Params(String),
}

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHashError>;

    fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool;
}

/// Argon2id hasher with a random 16-byte salt per hash.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, PasswordHashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| PasswordHashError::Params(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHashError> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| PasswordHashError::Entropy(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordHashError::Hashing(e.to_string()))?;

        let phc = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::Hashing(e.to_string()))?
            .to_string();
        Ok(PasswordHash(phc))
    }

    fn verify(&self, plaintext: &str, hash: &PasswordHash) -> bool {
        match PhcString::new(hash.as_str()) {
            Ok(parsed) => self.argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}
