use axum::Router;

pub mod system;
pub mod users;

/// Router for the user-management endpoints.
///
/// Every request arrives with a correlation context and a (possibly empty)
/// credential; the operation's role policy decides whether anonymous calls
/// are allowed.
pub fn router() -> Router {
    Router::new().nest("/users", users::router())
}
