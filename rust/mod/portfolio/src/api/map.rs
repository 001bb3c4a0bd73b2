use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use portfolio_core::ServiceError;

use crate::api::AppState;
use crate::policy::guardrail::VIEW_MAP_PATH;

pub fn routes() -> Router<AppState> {
    Router::new().route(VIEW_MAP_PATH, get(view_map))
}

async fn view_map(State(svc): State<AppState>) -> Result<Json<Vec<serde_json::Value>>, ServiceError> {
    Ok(Json(svc.map_rows()?))
}
