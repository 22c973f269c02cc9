//! Bootstrap of the first privileged account.

use core::fmt;

use warden_audit::AuditStore;
use warden_auth::{UserStore, UserView};
use warden_core::{CorrelationContext, Email};

use super::{
    Failure, Mutation, OperationKind, OperationOutcome, OperationPipeline, PipelineError, PipelineStage, StageTrail,
};

/// Credentials of the bootstrap account.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub name: String,
    pub lastname: String,
    pub email: Email,
    pub password: String,
}

impl SeedAccount {
    pub fn new(email: Email, password: impl Into<String>) -> Self {
        Self {
            name: "Super".to_string(),
            lastname: "Admin".to_string(),
            email,
            password: password.into(),
        }
    }
}

impl fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAccount")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(OperationOutcome),
    AlreadyPresent(UserView),
}

impl<U, A> OperationPipeline<U, A>
where
    U: UserStore,
    A: AuditStore + 'static,
{
    /// Make sure an account holding the privileged role exists.
    ///
    /// There is no actor yet, so the role check and guards are skipped; the
    /// creation is still audited, with no actor id.
    pub async fn seed_privileged(
        &self,
        ctx: &CorrelationContext,
        seed: &SeedAccount,
    ) -> Result<SeedOutcome, PipelineError> {
        if let Some(existing) = self.users.find_by_email(&seed.email).await? {
            tracing::info!(
                correlation_id = %ctx.correlation_id(),
                user_id = %existing.id,
                "bootstrap account already present"
            );
            return Ok(SeedOutcome::AlreadyPresent(UserView::from(&existing)));
        }

        let mut trail = StageTrail::start(ctx.correlation_id().clone());
        let mutation = Mutation::Create {
            name: seed.name.clone(),
            lastname: seed.lastname.clone(),
            email: seed.email.clone(),
            roles: vec![self.catalog.privileged().clone()],
            password: seed.password.clone(),
        };

        let committed = self
            .commit(OperationKind::Create, mutation)
            .await
            .map_err(|e| trail.stop(e.into()))?;
        trail.advance(PipelineStage::Executed);

        let user = committed
            .view()
            .ok_or_else(|| trail.stop(Failure::Internal("seed produced no state".to_string()).into()))?;
        let audit = self.audit(&trail.correlation_id, None, committed).await;
        if audit.is_recorded() {
            trail.advance(PipelineStage::Audited);
        }
        trail.advance(PipelineStage::Completed);

        tracing::info!(
            correlation_id = %trail.correlation_id,
            user_id = %user.id,
            "bootstrap account created"
        );

        Ok(SeedOutcome::Created(OperationOutcome {
            correlation_id: trail.correlation_id,
            action: OperationKind::Create.audit_action(),
            user,
            audit,
            stages: trail.stages,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_audit::{AuditAction, InMemoryAuditStore};
    use warden_auth::{Argon2PasswordHasher, PasswordHasher, Role};
    use warden_observability::TracingOperationalLogger;

    use super::*;
    use crate::user_store::InMemoryUserStore;

    fn pipeline() -> OperationPipeline<Arc<InMemoryUserStore>, Arc<InMemoryAuditStore>> {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::with_params(64, 1, 1).unwrap());
        OperationPipeline::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryAuditStore::new()),
            hasher,
            Arc::new(TracingOperationalLogger),
        )
    }

    fn seed() -> SeedAccount {
        SeedAccount::new(Email::parse("root@example.com").unwrap(), "Root123##")
    }

    #[tokio::test]
    async fn seeding_creates_an_audited_privileged_account_once() {
        let pipeline = pipeline();
        let ctx = CorrelationContext::from_header(Some("boot")).unwrap();

        let first = pipeline.seed_privileged(&ctx, &seed()).await.unwrap();
        let SeedOutcome::Created(outcome) = first else {
            panic!("expected a created account");
        };
        assert_eq!(outcome.user.roles, vec![Role::SUPERADMIN]);
        assert!(outcome.audit.is_recorded());

        let entries = pipeline.audit_store().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action(), AuditAction::Create);
        assert_eq!(entries[0].actor_id(), None);

        let second = pipeline.seed_privileged(&ctx, &seed()).await.unwrap();
        assert!(matches!(second, SeedOutcome::AlreadyPresent(ref u) if u.id == outcome.user.id));
        assert_eq!(pipeline.audit_store().len(), 1);
        assert_eq!(pipeline.users().len(), 1);
    }

    #[test]
    fn debug_hides_the_password() {
        assert!(!format!("{:?}", seed()).contains("Root123##"));
    }
}
