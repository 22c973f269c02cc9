//! Value objects: equality by value, not identity.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Normalized email address.
///
/// Stored trimmed and lower-cased so that uniqueness checks in the user store
/// are case-insensitive. Only a structural check is done here (`local@domain`);
/// deliverability is not this crate's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_lowercase();

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(DomainError::validation("email must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::validation(format!("invalid email: {normalized}")));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email must not contain spaces"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Email {}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}
