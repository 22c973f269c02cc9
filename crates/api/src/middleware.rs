use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

use warden_auth::{CredentialError, CredentialValidator};
use warden_core::{CORRELATION_ID_HEADER, CorrelationContext};

use crate::app::errors::json_error;
use crate::context::RequestCredential;

/// Adopt the caller's correlation id (or mint one), expose it to handlers and
/// echo it on the response.
pub async fn correlation_middleware(mut req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let supplied = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok());

    let ctx = match CorrelationContext::from_header(supplied) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "could not establish a correlation id");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "correlation_unavailable",
                "Please check server logs",
            );
        }
    };

    let span = tracing::info_span!(
        "request",
        correlation_id = %ctx.correlation_id(),
        method = %req.method(),
        path = %req.uri().path(),
    );
    let echoed = HeaderValue::from_str(ctx.correlation_id().as_str()).ok();
    req.extensions_mut().insert(ctx);

    let mut response = next.run(req).instrument(span).await;
    if let Some(value) = echoed {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

#[derive(Clone)]
pub struct AuthState {
    pub validator: Arc<dyn CredentialValidator>,
}

/// Validate the bearer token when one is presented.
///
/// A request without an `Authorization` header continues anonymously; a
/// header that is present but unusable is rejected here.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let credential = match extract_bearer(req.headers()) {
        Ok(None) => None,
        Ok(Some(token)) => match state.validator.validate(token, Utc::now()) {
            Ok(claims) => Some(claims),
            Err(e) => return credential_error_to_response(e),
        },
        Err(response) => return response,
    };

    req.extensions_mut().insert(RequestCredential::new(credential));
    next.run(req).await
}

fn credential_error_to_response(err: CredentialError) -> Response {
    tracing::info!(error = %err, "bearer token rejected");
    match err {
        CredentialError::ExpiredToken => json_error(StatusCode::UNAUTHORIZED, "expired_token", "token has expired"),
        CredentialError::InvalidToken(_) => json_error(StatusCode::UNAUTHORIZED, "invalid_token", "invalid token"),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, Response> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let unauthorized = || json_error(StatusCode::UNAUTHORIZED, "invalid_token", "malformed authorization header");

    let header = header.to_str().map_err(|_| unauthorized())?;
    let header = header.strip_prefix("Bearer ").ok_or_else(unauthorized)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(unauthorized());
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use axum::http::header::AUTHORIZATION;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert!(matches!(extract_bearer(&HeaderMap::new()), Ok(None)));
    }

    #[test]
    fn bearer_token_is_trimmed() {
        let headers = headers("Bearer  abc.def.ghi ");
        assert_eq!(extract_bearer(&headers).ok().flatten(), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_unauthorized() {
        for value in ["Basic dXNlcjpwdw==", "Bearer ", "token"] {
            let response = extract_bearer(&headers(value)).unwrap_err();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{value}");
        }
    }
}
