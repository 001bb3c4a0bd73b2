use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use portfolio_core::ServiceError;

use crate::api::AppState;
use crate::model::Identity;

/// Resolve the requester and store an [`Identity`] in request extensions.
///
/// No `Authorization` header means anonymous. A header that is not a
/// valid bearer token for a live session is rejected with 401.
pub async fn identity_middleware(
    State(svc): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let identity = match extract_bearer(req.headers())? {
        Some(token) => svc.authenticate_token(token)?,
        None => Identity::Anonymous,
    };
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, ServiceError> {
    let Some(value) = headers.get("authorization") else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(Some)
        .ok_or_else(|| ServiceError::Unauthorized("expected a Bearer token".into()))
}
