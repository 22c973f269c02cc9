//! Infrastructure layer: the operation pipeline, store adapters, config.

pub mod config;
pub mod directory;
pub mod pipeline;
pub mod user_store;


pub use config::{ConfigError, WardenConfig};
pub use directory::UserDirectory;
pub use pipeline::{
    AUDIT_WRITE_FAILED_ALERT, AuditStatus, CreateUser, ErrorCategory, Failure, OperationKind, OperationOutcome,
    OperationPipeline, OperationPolicies, PipelineError, PipelineStage, Rejection, RequiredRoles, SeedAccount,
    SeedOutcome, UpdateUser, UserOperation,
};
pub use user_store::InMemoryUserStore;
