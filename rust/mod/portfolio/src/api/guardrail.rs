use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::model::Identity;
use crate::policy::{decide, Decision};

/// Route layer around [`decide`]: a redirect short-circuits with 302.
pub async fn guardrail(req: Request, next: Next) -> Response {
    let requester = req.extensions().get::<Identity>().and_then(Identity::account);
    let decision = decide(requester, req.uri().path());
    match decision {
        Decision::Allow => next.run(req).await,
        Decision::Redirect(location) => {
            debug!(path = %req.uri().path(), %location, "staff redirected");
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
    }
}
