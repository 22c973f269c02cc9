//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and pipeline wiring, bootstrap seeding
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and input validation
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use thiserror::Error;
use tower::ServiceBuilder;

use warden_auth::{Argon2PasswordHasher, PasswordHasher};
use warden_core::CorrelationError;
use warden_infra::{PipelineError, WardenConfig};

use crate::jwt::Hs256CredentialValidator;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("JWT_SECRET must be set")]
    MissingJwtSecret,

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error("seeding the bootstrap account failed: {0}")]
    Seed(#[from] PipelineError),
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: WardenConfig) -> Result<Router, StartupError> {
    build_app_with_hasher(config, Arc::new(Argon2PasswordHasher::new())).await
}

/// Same as [`build_app`] with an explicit password hasher (tests use cheap
/// Argon2 parameters).
pub async fn build_app_with_hasher(
    config: WardenConfig,
    hasher: Arc<dyn PasswordHasher>,
) -> Result<Router, StartupError> {
    let secret = config.jwt_secret.clone().ok_or(StartupError::MissingJwtSecret)?;
    let auth_state = middleware::AuthState {
        validator: Arc::new(Hs256CredentialValidator::new(secret.into_bytes()).with_leeway(config.jwt_leeway)),
    };

    let services = Arc::new(services::build_services(&config, hasher).await?);

    let users = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(users)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::correlation_middleware))))
}
