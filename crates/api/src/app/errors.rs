use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use warden_infra::{ErrorCategory, Failure, PipelineError};

pub fn pipeline_error_to_response(err: PipelineError) -> axum::response::Response {
    let code = err.reason_code();
    let status = match err.category() {
        ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
        ErrorCategory::Authorization => StatusCode::FORBIDDEN,
        ErrorCategory::Validation | ErrorCategory::Conflict => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Concurrency => StatusCode::CONFLICT,
        ErrorCategory::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    };

    match err {
        PipelineError::Failed(Failure::StoreUnavailable(_) | Failure::Internal(_)) => {
            tracing::error!(error = %err, "operation failed");
            json_error(status, code, "Please check server logs")
        }
        PipelineError::Failed(failure) => json_error(status, code, failure.to_string()),
        PipelineError::Rejected(rejection) => json_error(status, code, rejection.to_string()),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
