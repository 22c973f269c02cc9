use std::sync::Arc;

use warden_audit::InMemoryAuditStore;
use warden_auth::PasswordHasher;
use warden_core::CorrelationContext;
use warden_infra::{InMemoryUserStore, OperationPipeline, SeedOutcome, UserDirectory, WardenConfig};
use warden_observability::TracingOperationalLogger;

use super::StartupError;

pub type UserStoreHandle = Arc<InMemoryUserStore>;
pub type AuditStoreHandle = Arc<InMemoryAuditStore>;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub pipeline: OperationPipeline<UserStoreHandle, AuditStoreHandle>,
    pub directory: UserDirectory<UserStoreHandle>,
}

pub async fn build_services(
    config: &WardenConfig,
    hasher: Arc<dyn PasswordHasher>,
) -> Result<AppServices, StartupError> {
    let users: UserStoreHandle = Arc::new(InMemoryUserStore::new());
    let audit: AuditStoreHandle = Arc::new(InMemoryAuditStore::new());

    let pipeline = OperationPipeline::new(users.clone(), audit, hasher, Arc::new(TracingOperationalLogger))
        .with_catalog(config.catalog.clone())
        .with_policies(config.policies.clone());
    let directory = UserDirectory::new(users, config.page_limit);

    if let Some(seed) = &config.seed {
        let ctx = CorrelationContext::generate()?;
        match pipeline.seed_privileged(&ctx, seed).await? {
            SeedOutcome::Created(outcome) => {
                tracing::info!(user_id = %outcome.user.id, "seeded bootstrap account")
            }
            SeedOutcome::AlreadyPresent(view) => {
                tracing::debug!(user_id = %view.id, "bootstrap account already present")
            }
        }
    }

    Ok(AppServices { pipeline, directory })
}
