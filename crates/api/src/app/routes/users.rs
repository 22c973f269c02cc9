use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
};

use warden_core::CorrelationContext;
use warden_infra::{AuditStatus, OperationOutcome, UserOperation};

use crate::app::dto::{CreateUserRequest, ListQuery, UpdateUserRequest, UserResponse, parse_user_id};
use crate::app::errors::pipeline_error_to_response;
use crate::app::services::AppServices;
use crate::context::RequestCredential;

/// Response header naming the audit entry a mutation produced.
pub const AUDIT_ENTRY_HEADER: &str = "x-audit-entry-id";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(find_user).patch(update_user).delete(deactivate_user))
        .route("/:id/purge", delete(purge_user))
}

async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CorrelationContext>,
    Extension(credential): Extension<RequestCredential>,
    Json(req): Json<CreateUserRequest>,
) -> axum::response::Response {
    let create = match req.into_operation() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    run(&services, &ctx, &credential, UserOperation::Create(create), StatusCode::CREATED).await
}

async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CorrelationContext>,
    Extension(credential): Extension<RequestCredential>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let changes = match req.into_changes() {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    run(&services, &ctx, &credential, UserOperation::Update { target, changes }, StatusCode::OK).await
}

async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CorrelationContext>,
    Extension(credential): Extension<RequestCredential>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    run(&services, &ctx, &credential, UserOperation::Deactivate { target }, StatusCode::OK).await
}

async fn purge_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<CorrelationContext>,
    Extension(credential): Extension<RequestCredential>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let target = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    run(&services, &ctx, &credential, UserOperation::Delete { target }, StatusCode::OK).await
}

async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    if let Err(resp) = query.validate() {
        return resp;
    }
    match services.directory.list(query.limit, query.offset).await {
        Ok(users) => {
            let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            (StatusCode::OK, Json(users)).into_response()
        }
        Err(e) => pipeline_error_to_response(e),
    }
}

async fn find_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(term): Path<String>,
) -> axum::response::Response {
    match services.directory.find(&term).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(e) => pipeline_error_to_response(e),
    }
}

async fn run(
    services: &AppServices,
    ctx: &CorrelationContext,
    credential: &RequestCredential,
    operation: UserOperation,
    status: StatusCode,
) -> axum::response::Response {
    match services.pipeline.execute(ctx, credential.get(), operation).await {
        Ok(outcome) => outcome_response(status, outcome),
        Err(e) => pipeline_error_to_response(e),
    }
}

fn outcome_response(status: StatusCode, outcome: OperationOutcome) -> axum::response::Response {
    let audit_entry = match &outcome.audit {
        AuditStatus::Recorded(id) => HeaderValue::from_str(&id.to_string()).ok(),
        AuditStatus::Failed(_) => None,
    };

    let mut response = (status, Json(UserResponse::from(outcome.user))).into_response();
    if let Some(value) = audit_entry {
        response.headers_mut().insert(AUDIT_ENTRY_HEADER, value);
    }
    response
}
