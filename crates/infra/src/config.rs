//! Configuration loading and representation.
//!
//! Everything comes from environment variables. Loading goes through a key
//! lookup so tests can supply values without touching the process
//! environment.

use chrono::Duration;
use thiserror::Error;

use warden_auth::{Role, RoleCatalog};
use warden_core::{DomainError, Email};
use warden_observability::{LogFormat, ParseLogFormatError};

use crate::pipeline::{OperationKind, OperationPolicies, RequiredRoles, SeedAccount};

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_JWT_LEEWAY_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("role configuration: {0}")]
    Roles(#[from] DomainError),

    #[error(transparent)]
    LogFormat(#[from] ParseLogFormatError),

    #[error("WARDEN_SEED_EMAIL and WARDEN_SEED_PASSWORD must be set together")]
    IncompleteSeed,
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct WardenConfig {
    pub catalog: RoleCatalog,
    pub policies: OperationPolicies,
    pub page_limit: usize,
    pub seed: Option<SeedAccount>,
    /// HS256 secret for bearer tokens. The API refuses to start without it.
    pub jwt_secret: Option<String>,
    /// Clock skew tolerated on token `iat`/`exp`.
    pub jwt_leeway: Duration,
    pub port: u16,
    pub log_format: LogFormat,
}

impl core::fmt::Debug for WardenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WardenConfig")
            .field("catalog", &self.catalog)
            .field("policies", &self.policies)
            .field("page_limit", &self.page_limit)
            .field("seed", &self.seed)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_leeway", &self.jwt_leeway)
            .field("port", &self.port)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            catalog: RoleCatalog::default(),
            policies: OperationPolicies::default(),
            page_limit: DEFAULT_PAGE_LIMIT,
            seed: None,
            jwt_secret: None,
            jwt_leeway: Duration::seconds(DEFAULT_JWT_LEEWAY_SECS),
            port: DEFAULT_PORT,
            log_format: LogFormat::default(),
        }
    }
}

impl WardenConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let roles = match get("WARDEN_ROLES") {
            Some(list) => split_list(&list).into_iter().map(Role::new).collect(),
            None => RoleCatalog::default().roles().to_vec(),
        };
        let privileged = get("WARDEN_PRIVILEGED_ROLE").map(Role::new).unwrap_or(Role::SUPERADMIN);
        let default_role = get("WARDEN_DEFAULT_ROLE").map(Role::new).unwrap_or(Role::USER);
        let catalog = RoleCatalog::new(roles, privileged, default_role)?;

        let mut policies = OperationPolicies::uniform(default_required_roles(&catalog));
        for kind in OperationKind::ALL {
            if let Some(raw) = get(required_roles_key(kind)) {
                let required = catalog.parse_all(&split_list(&raw))?;
                policies = policies.with(kind, RequiredRoles::new(required));
            }
        }

        let page_limit = match get("WARDEN_PAGE_LIMIT") {
            Some(raw) => parse_page_limit(&raw)?,
            None => DEFAULT_PAGE_LIMIT,
        };

        let seed = match (get("WARDEN_SEED_EMAIL"), lookup("WARDEN_SEED_PASSWORD")) {
            (None, None) => None,
            (Some(email), Some(password)) if !password.is_empty() => {
                let email = Email::parse(&email).map_err(|e| ConfigError::invalid("WARDEN_SEED_EMAIL", e.to_string()))?;
                Some(SeedAccount::new(email, password))
            }
            _ => return Err(ConfigError::IncompleteSeed),
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid("PORT", e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let jwt_leeway = match get("WARDEN_JWT_LEEWAY_SECS") {
            Some(raw) => parse_leeway(&raw)?,
            None => Duration::seconds(DEFAULT_JWT_LEEWAY_SECS),
        };

        let log_format = match get("WARDEN_LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            catalog,
            policies,
            page_limit,
            seed,
            jwt_secret: lookup("JWT_SECRET").filter(|s| !s.is_empty()),
            jwt_leeway,
            port,
            log_format,
        })
    }
}

/// The catalog's privileged role, plus ADMIN when the catalog has one.
fn default_required_roles(catalog: &RoleCatalog) -> RequiredRoles {
    let mut roles = vec![catalog.privileged().clone()];
    if catalog.contains(&Role::ADMIN) {
        roles.push(Role::ADMIN);
    }
    RequiredRoles::new(roles)
}

fn required_roles_key(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Create => "WARDEN_REQUIRED_ROLES_CREATE",
        OperationKind::Update => "WARDEN_REQUIRED_ROLES_UPDATE",
        OperationKind::Deactivate => "WARDEN_REQUIRED_ROLES_DEACTIVATE",
        OperationKind::Delete => "WARDEN_REQUIRED_ROLES_DELETE",
    }
}

/// Comma separated, blanks dropped. An empty string is an empty list.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_page_limit(raw: &str) -> Result<usize, ConfigError> {
    let limit = raw
        .parse::<usize>()
        .map_err(|e| ConfigError::invalid("WARDEN_PAGE_LIMIT", e.to_string()))?;
    if limit == 0 {
        return Err(ConfigError::invalid("WARDEN_PAGE_LIMIT", "must be at least 1"));
    }
    Ok(limit)
}

fn parse_leeway(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw
        .parse::<u32>()
        .map_err(|e| ConfigError::invalid("WARDEN_JWT_LEEWAY_SECS", e.to_string()))?;
    Ok(Duration::seconds(i64::from(secs)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use warden_auth::OperationPolicy;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<WardenConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        WardenConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_any_variable() {
        let config = load(&[]).unwrap();

        assert_eq!(config.catalog, RoleCatalog::default());
        assert_eq!(config.policies, OperationPolicies::default());
        assert_eq!(config.page_limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.seed.is_none());
        assert!(config.jwt_secret.is_none());
        assert_eq!(config.jwt_leeway, Duration::seconds(DEFAULT_JWT_LEEWAY_SECS));
    }

    #[test]
    fn empty_required_roles_make_an_operation_public() {
        let config = load(&[
            ("WARDEN_REQUIRED_ROLES_CREATE", ""),
            ("WARDEN_REQUIRED_ROLES_DELETE", "superadmin"),
        ])
        .unwrap();

        assert!(config.policies.for_kind(OperationKind::Create).is_public());
        assert_eq!(
            config.policies.for_kind(OperationKind::Delete).required_roles(),
            &[Role::SUPERADMIN]
        );
        assert_eq!(
            config.policies.for_kind(OperationKind::Update).required_roles(),
            &[Role::SUPERADMIN, Role::ADMIN]
        );
    }

    #[test]
    fn custom_catalog() {
        let config = load(&[
            ("WARDEN_ROLES", "owner, staff ,guest"),
            ("WARDEN_PRIVILEGED_ROLE", "owner"),
            ("WARDEN_DEFAULT_ROLE", "guest"),
            ("WARDEN_REQUIRED_ROLES_CREATE", "OWNER,STAFF"),
            ("WARDEN_REQUIRED_ROLES_UPDATE", "OWNER"),
            ("WARDEN_REQUIRED_ROLES_DEACTIVATE", "OWNER"),
            ("WARDEN_REQUIRED_ROLES_DELETE", "OWNER"),
        ])
        .unwrap();

        assert_eq!(config.catalog.privileged(), &Role::new("OWNER"));
        assert_eq!(config.catalog.default_role(), &Role::new("GUEST"));
    }

    #[test]
    fn default_required_roles_follow_a_catalog_without_admin() {
        let config = load(&[
            ("WARDEN_ROLES", "owner,guest"),
            ("WARDEN_PRIVILEGED_ROLE", "owner"),
            ("WARDEN_DEFAULT_ROLE", "guest"),
        ])
        .unwrap();

        for kind in OperationKind::ALL {
            assert_eq!(config.policies.for_kind(kind).required_roles(), &[Role::new("OWNER")]);
        }
    }

    #[test]
    fn default_required_roles_use_the_configured_privileged_role() {
        let config = load(&[
            ("WARDEN_ROLES", "owner,admin,guest"),
            ("WARDEN_PRIVILEGED_ROLE", "owner"),
            ("WARDEN_DEFAULT_ROLE", "guest"),
            ("WARDEN_REQUIRED_ROLES_DELETE", "owner"),
        ])
        .unwrap();

        assert_eq!(
            config.policies.for_kind(OperationKind::Update).required_roles(),
            &[Role::new("OWNER"), Role::ADMIN]
        );
        assert_eq!(
            config.policies.for_kind(OperationKind::Delete).required_roles(),
            &[Role::new("OWNER")]
        );
    }

    #[test]
    fn jwt_leeway_is_configurable() {
        assert_eq!(
            load(&[("WARDEN_JWT_LEEWAY_SECS", "5")]).unwrap().jwt_leeway,
            Duration::seconds(5)
        );
        assert!(matches!(
            load(&[("WARDEN_JWT_LEEWAY_SECS", "-1")]).unwrap_err(),
            ConfigError::Invalid { key: "WARDEN_JWT_LEEWAY_SECS", .. }
        ));
    }

    #[test]
    fn required_roles_outside_the_catalog_are_rejected() {
        let err = load(&[("WARDEN_REQUIRED_ROLES_UPDATE", "AUDITOR")]).unwrap_err();
        assert!(matches!(err, ConfigError::Roles(DomainError::UnknownRole(ref r)) if r == "AUDITOR"));
    }

    #[test]
    fn seed_needs_both_halves() {
        assert!(matches!(
            load(&[("WARDEN_SEED_EMAIL", "root@example.com")]).unwrap_err(),
            ConfigError::IncompleteSeed
        ));

        let config = load(&[
            ("WARDEN_SEED_EMAIL", "Root@Example.com"),
            ("WARDEN_SEED_PASSWORD", "Root123##"),
        ])
        .unwrap();
        let seed = config.seed.unwrap();
        assert_eq!(seed.email.as_str(), "root@example.com");
        assert_eq!(seed.password, "Root123##");
    }

    #[test]
    fn invalid_numbers_and_formats() {
        assert!(matches!(
            load(&[("WARDEN_PAGE_LIMIT", "0")]).unwrap_err(),
            ConfigError::Invalid { key: "WARDEN_PAGE_LIMIT", .. }
        ));
        assert!(matches!(
            load(&[("PORT", "http")]).unwrap_err(),
            ConfigError::Invalid { key: "PORT", .. }
        ));
        assert!(matches!(
            load(&[("WARDEN_LOG_FORMAT", "xml")]).unwrap_err(),
            ConfigError::LogFormat(_)
        ));
        assert_eq!(
            load(&[("WARDEN_LOG_FORMAT", "pretty")]).unwrap().log_format,
            LogFormat::Pretty
        );
    }
}
