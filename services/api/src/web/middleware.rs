//! services/api/src/web/middleware.rs
//!
//! Identity middleware for user-scoped routes.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::warn;

/// Header carrying the signed-in user's id, set by the identity provider's gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user's identity, inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Middleware that extracts the user id and makes it available to handlers.
///
/// If missing or blank, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            warn!("Rejected request to {} without a user id.", req.uri().path());
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(UserId(user_id));
    Ok(next.run(req).await)
}
