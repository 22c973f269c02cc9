//! Operation pipeline (application-level orchestration).
//!
//! Every user mutation runs through the same stages:
//!
//! ```text
//! Started
//!   ↓  resolve principal (identity resolver)
//! Authenticated
//!   ↓  generic role check, password confirmation, target lookup,
//!   ↓  self-protection guards
//! Authorized
//!   ↓  hash password, mutate the user store
//! Executed
//!   ↓  append one audit entry (spawned task, awaited)
//! Audited
//!   ↓
//! Completed
//! ```
//!
//! `Rejected` and `Failed` are absorbing. Nothing is written to either store
//! before `Authorized`. A failed audit write is reported to the operational
//! logger and never fails the request: the user store is the source of truth.

mod error;
mod operation;
mod seed;

use std::sync::Arc;

use core::fmt;

use tracing::Instrument;

use warden_audit::{AuditAction, AuditRecord, AuditRecorder, AuditStore};
use warden_auth::{
    IdentityResolver, NewUser, OperationPolicy, PasswordHash, PasswordHasher, Principal, Role, RoleCatalog,
    SelfProtection, UserChanges, UserRecord, UserStore, UserView, ValidatedCredential, authorize, dedup_roles,
};
use warden_core::{AuditEntryId, CorrelationContext, CorrelationId, Email, UserId};
use warden_observability::{LogLevel, OperationalEvent, OperationalLogger};

pub use error::{ErrorCategory, Failure, PipelineError, Rejection};
pub use operation::{CreateUser, OperationKind, OperationPolicies, RequiredRoles, UpdateUser, UserOperation};
pub use seed::{SeedAccount, SeedOutcome};

/// Alert key attached to operational events for lost audit writes.
pub const AUDIT_WRITE_FAILED_ALERT: &str = "audit_write_failed";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Started,
    Authenticated,
    Authorized,
    Executed,
    Audited,
    Completed,
    Rejected,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Started => "started",
            PipelineStage::Authenticated => "authenticated",
            PipelineStage::Authorized => "authorized",
            PipelineStage::Executed => "executed",
            PipelineStage::Audited => "audited",
            PipelineStage::Completed => "completed",
            PipelineStage::Rejected => "rejected",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the audit step. Never an error of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditStatus {
    Recorded(AuditEntryId),
    Failed(String),
}

impl AuditStatus {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditStatus::Recorded(_))
    }
}

/// A completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub correlation_id: CorrelationId,
    pub action: AuditAction,
    /// Resulting state; for deletes, the last state before removal.
    pub user: UserView,
    pub audit: AuditStatus,
    /// Stages passed through, in order.
    pub stages: Vec<PipelineStage>,
}

/// Stage bookkeeping for one request.
struct StageTrail {
    correlation_id: CorrelationId,
    stages: Vec<PipelineStage>,
}

impl StageTrail {
    fn start(correlation_id: CorrelationId) -> Self {
        let mut trail = Self {
            correlation_id,
            stages: Vec::with_capacity(6),
        };
        trail.advance(PipelineStage::Started);
        trail
    }

    fn advance(&mut self, stage: PipelineStage) {
        tracing::debug!(correlation_id = %self.correlation_id, %stage, "pipeline stage reached");
        self.stages.push(stage);
    }

    fn current(&self) -> PipelineStage {
        self.stages.last().copied().unwrap_or(PipelineStage::Started)
    }

    fn stop(&mut self, error: PipelineError) -> PipelineError {
        let from = self.current();
        let stage = error.stage();
        match &error {
            PipelineError::Rejected(_) => tracing::info!(
                correlation_id = %self.correlation_id,
                %from,
                %stage,
                reason = error.reason_code(),
                "operation rejected: {error}"
            ),
            PipelineError::Failed(_) => tracing::warn!(
                correlation_id = %self.correlation_id,
                %from,
                %stage,
                reason = error.reason_code(),
                "operation failed: {error}"
            ),
        }
        self.stages.push(stage);
        error
    }
}

/// What an authorized operation will do to the store.
enum Mutation {
    Create {
        name: String,
        lastname: String,
        email: Email,
        roles: Vec<Role>,
        password: String,
    },
    Update {
        before: UserRecord,
        changes: UserChanges,
    },
    Deactivate {
        before: UserRecord,
    },
    Delete {
        before: UserRecord,
    },
}

/// States captured around a committed mutation.
struct Committed {
    action: AuditAction,
    before: Option<UserRecord>,
    after: Option<UserRecord>,
}

impl Committed {
    fn view(&self) -> Option<UserView> {
        self.after.as_ref().or(self.before.as_ref()).map(UserView::from)
    }
}

/// Binds identity resolution, the policy engine, the user store and the audit
/// recorder around user mutations.
///
/// ## Generic Parameters
///
/// - `U`: user store (cloned once, for the identity resolver)
/// - `A`: audit store; the recorder is shared with spawned audit tasks
pub struct OperationPipeline<U, A> {
    users: U,
    identity: IdentityResolver<U>,
    recorder: Arc<AuditRecorder<A>>,
    hasher: Arc<dyn PasswordHasher>,
    logger: Arc<dyn OperationalLogger>,
    catalog: RoleCatalog,
    guards: SelfProtection,
    policies: OperationPolicies,
}

impl<U, A> OperationPipeline<U, A>
where
    U: Clone,
{
    pub fn new(users: U, audit: A, hasher: Arc<dyn PasswordHasher>, logger: Arc<dyn OperationalLogger>) -> Self {
        let catalog = RoleCatalog::default();
        Self {
            identity: IdentityResolver::new(users.clone()),
            users,
            recorder: Arc::new(AuditRecorder::new(audit)),
            hasher,
            logger,
            guards: SelfProtection::from_catalog(&catalog),
            catalog,
            policies: OperationPolicies::default(),
        }
    }
}

impl<U, A> OperationPipeline<U, A> {
    pub fn with_catalog(mut self, catalog: RoleCatalog) -> Self {
        self.guards = SelfProtection::from_catalog(&catalog);
        self.catalog = catalog;
        self
    }

    pub fn with_policies(mut self, policies: OperationPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    pub fn policies(&self) -> &OperationPolicies {
        &self.policies
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    pub fn audit_store(&self) -> &A {
        self.recorder.store()
    }
}

impl<U, A> OperationPipeline<U, A>
where
    U: UserStore,
    A: AuditStore + 'static,
{
    /// Run an operation for the holder of `credential` (`None`: anonymous).
    pub async fn execute(
        &self,
        ctx: &CorrelationContext,
        credential: Option<&ValidatedCredential>,
        operation: UserOperation,
    ) -> Result<OperationOutcome, PipelineError> {
        let correlation_id = ctx.correlation_id().clone();
        let span = operation_span(&correlation_id, operation.kind());

        async move {
            let mut trail = StageTrail::start(correlation_id);
            let principal = match credential {
                Some(credential) => Some(
                    self.identity
                        .resolve(credential)
                        .await
                        .map_err(|e| trail.stop(e.into()))?,
                ),
                None => None,
            };
            self.run(trail, principal, operation).await
        }
        .instrument(span)
        .await
    }

    /// Run an operation for an already resolved principal.
    pub async fn execute_as(
        &self,
        ctx: &CorrelationContext,
        principal: Option<Principal>,
        operation: UserOperation,
    ) -> Result<OperationOutcome, PipelineError> {
        let correlation_id = ctx.correlation_id().clone();
        let span = operation_span(&correlation_id, operation.kind());
        let trail = StageTrail::start(correlation_id);
        self.run(trail, principal, operation).instrument(span).await
    }

    async fn run(
        &self,
        mut trail: StageTrail,
        principal: Option<Principal>,
        operation: UserOperation,
    ) -> Result<OperationOutcome, PipelineError> {
        let actor = principal.as_ref();
        if actor.is_some_and(|p| !p.is_active) {
            return Err(trail.stop(Rejection::PrincipalInactive.into()));
        }
        trail.advance(PipelineStage::Authenticated);

        let kind = operation.kind();
        let mutation = self
            .authorize_operation(actor, operation)
            .await
            .map_err(|e| trail.stop(e))?;
        trail.advance(PipelineStage::Authorized);

        let committed = self.commit(kind, mutation).await.map_err(|e| trail.stop(e.into()))?;
        trail.advance(PipelineStage::Executed);

        let user = committed
            .view()
            .ok_or_else(|| trail.stop(Failure::Internal("mutation produced no state".to_string()).into()))?;

        let audit = self
            .audit(&trail.correlation_id, actor.map(|p| p.id), committed)
            .await;
        if audit.is_recorded() {
            trail.advance(PipelineStage::Audited);
        }
        trail.advance(PipelineStage::Completed);

        tracing::info!(
            correlation_id = %trail.correlation_id,
            operation = %kind,
            user_id = %user.id,
            audited = audit.is_recorded(),
            "operation completed"
        );

        Ok(OperationOutcome {
            correlation_id: trail.correlation_id,
            action: kind.audit_action(),
            user,
            audit,
            stages: trail.stages,
        })
    }

    /// Authenticated → Authorized. Reads only; never mutates.
    async fn authorize_operation(
        &self,
        actor: Option<&Principal>,
        operation: UserOperation,
    ) -> Result<Mutation, PipelineError> {
        let required = self.policies.for_kind(operation.kind());
        authorize(actor, required.required_roles()).into_result()?;

        match operation {
            UserOperation::Create(input) => {
                if input.password != input.confirm_password {
                    return Err(Rejection::PasswordMismatch.into());
                }

                let roles = match self.requested_roles(input.roles)? {
                    Some(roles) => roles,
                    None => vec![self.catalog.default_role().clone()],
                };
                self.guards.check_grant(actor, &roles).into_result()?;

                Ok(Mutation::Create {
                    name: input.name,
                    lastname: input.lastname,
                    email: input.email,
                    roles,
                    password: input.password,
                })
            }
            UserOperation::Update { target, changes } => {
                let roles = self.requested_roles(changes.roles)?;
                if let Some(roles) = &roles {
                    self.guards.check_grant(actor, roles).into_result()?;
                }

                // Hash before reading the target: the guard below and the
                // conditional write in `commit` must see the same version.
                let password_hash = match confirmed_password(changes.password, changes.confirm_password)? {
                    Some(password) => Some(self.hash_password(password).await?),
                    None => None,
                };

                let before = self.load_target(target).await?;
                self.guards.check_target(actor, target, &before.roles).into_result()?;

                Ok(Mutation::Update {
                    before,
                    changes: UserChanges {
                        name: changes.name,
                        lastname: changes.lastname,
                        email: changes.email,
                        password_hash,
                        roles,
                        is_active: changes.is_active,
                    },
                })
            }
            UserOperation::Deactivate { target } => {
                let before = self.load_target(target).await?;
                self.guards.check_target(actor, target, &before.roles).into_result()?;
                Ok(Mutation::Deactivate { before })
            }
            UserOperation::Delete { target } => {
                let before = self.load_target(target).await?;
                self.guards.check_target(actor, target, &before.roles).into_result()?;
                Ok(Mutation::Delete { before })
            }
        }
    }

    /// Authorized → Executed.
    ///
    /// Updates and deletes are conditional on the version the guards saw, so
    /// `before` is exactly the state the write replaced.
    async fn commit(&self, kind: OperationKind, mutation: Mutation) -> Result<Committed, Failure> {
        let action = kind.audit_action();
        match mutation {
            Mutation::Create {
                name,
                lastname,
                email,
                roles,
                password,
            } => {
                let password_hash = self.hash_password(password).await?;
                let created = self
                    .users
                    .create(NewUser {
                        id: UserId::new(),
                        name,
                        lastname,
                        email,
                        password_hash,
                        roles,
                        is_active: true,
                    })
                    .await?;
                Ok(Committed {
                    action,
                    before: None,
                    after: Some(created),
                })
            }
            Mutation::Update { before, changes } => {
                let after = self.users.update(before.id, before.version, changes).await?;
                Ok(Committed {
                    action,
                    before: Some(before),
                    after: Some(after),
                })
            }
            Mutation::Deactivate { before } => {
                let after = self
                    .users
                    .update(before.id, before.version, UserChanges::deactivate())
                    .await?;
                Ok(Committed {
                    action,
                    before: Some(before),
                    after: Some(after),
                })
            }
            Mutation::Delete { before } => {
                let removed = self.users.delete(before.id, before.version).await?;
                Ok(Committed {
                    action,
                    before: Some(removed),
                    after: None,
                })
            }
        }
    }

    /// Executed → Audited.
    ///
    /// The write runs on its own task so that dropping the request future
    /// from here on does not cancel it.
    async fn audit(
        &self,
        correlation_id: &CorrelationId,
        actor_id: Option<UserId>,
        committed: Committed,
    ) -> AuditStatus {
        let record = match AuditRecord::capture(
            committed.action,
            actor_id,
            committed.before.as_ref(),
            committed.after.as_ref(),
            correlation_id.clone(),
        ) {
            Ok(record) => record,
            Err(err) => {
                report_audit_failure(self.logger.as_ref(), correlation_id, &err);
                return AuditStatus::Failed(err.to_string());
            }
        };

        let recorder = Arc::clone(&self.recorder);
        let logger = Arc::clone(&self.logger);
        let task_correlation_id = correlation_id.clone();
        let write = tokio::spawn(
            async move {
                match recorder.record(record).await {
                    Ok(entry) => AuditStatus::Recorded(entry.id()),
                    Err(err) => {
                        report_audit_failure(logger.as_ref(), &task_correlation_id, &err);
                        AuditStatus::Failed(err.to_string())
                    }
                }
            }
            .in_current_span(),
        );

        match write.await {
            Ok(status) => status,
            Err(join) => {
                report_audit_failure(self.logger.as_ref(), correlation_id, &join);
                AuditStatus::Failed(join.to_string())
            }
        }
    }

    async fn load_target(&self, target: UserId) -> Result<UserRecord, PipelineError> {
        self.users
            .find_by_id(target)
            .await?
            .ok_or_else(|| PipelineError::not_found(target))
    }

    /// Normalise requested roles against the catalog. `None` stays `None`.
    fn requested_roles(&self, roles: Option<Vec<Role>>) -> Result<Option<Vec<Role>>, Rejection> {
        let Some(roles) = roles else {
            return Ok(None);
        };
        if roles.is_empty() {
            return Err(Rejection::InvalidRoles("a user needs at least one role".to_string()));
        }

        let parsed = roles
            .iter()
            .map(|r| self.catalog.parse(r.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Rejection::InvalidRoles(e.to_string()))?;
        Ok(Some(dedup_roles(parsed)))
    }

    async fn hash_password(&self, password: String) -> Result<PasswordHash, Failure> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Failure::Internal(format!("password hashing task failed: {e}")))?
            .map_err(Failure::from)
    }
}

fn operation_span(correlation_id: &CorrelationId, kind: OperationKind) -> tracing::Span {
    tracing::info_span!("operation", correlation_id = %correlation_id, operation = %kind)
}

/// Both password fields must be absent, or present and equal.
fn confirmed_password(password: Option<String>, confirm: Option<String>) -> Result<Option<String>, Rejection> {
    match (password, confirm) {
        (None, None) => Ok(None),
        (Some(password), Some(confirm)) if password == confirm => Ok(Some(password)),
        _ => Err(Rejection::PasswordMismatch),
    }
}

fn report_audit_failure(logger: &dyn OperationalLogger, correlation_id: &CorrelationId, error: &dyn fmt::Display) {
    logger.log(
        OperationalEvent::new(
            LogLevel::Error,
            correlation_id.as_str(),
            "audit",
            format!("audit write failed: {error}"),
        )
        .with_alert(AUDIT_WRITE_FAILED_ALERT),
    );
}
