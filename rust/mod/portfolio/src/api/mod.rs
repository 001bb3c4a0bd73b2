mod accounts;
mod audit;
mod guardrail;
mod map;
mod middleware;
mod session;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;

use crate::service::PortfolioService;

/// Shared application state.
pub type AppState = Arc<PortfolioService>;

/// Build the portfolio router.
///
/// Identity is resolved for every request; the staff guardrail runs only
/// for matched routes, after identity.
pub fn build_router(svc: Arc<PortfolioService>) -> Router {
    Router::new()
        .merge(session::routes())
        .merge(accounts::routes())
        .merge(map::routes())
        .merge(audit::routes())
        .route_layer(from_fn(guardrail::guardrail))
        .layer(from_fn_with_state(svc.clone(), middleware::identity_middleware))
        .with_state(svc)
}
