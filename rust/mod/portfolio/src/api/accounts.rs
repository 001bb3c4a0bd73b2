use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use portfolio_core::{ListParams, ListResult, ServiceError};

use crate::api::AppState;
use crate::model::{AccountView, Identity};
use crate::service::account::ChangeForm;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/portfolio/user/", get(list_accounts))
        .route(
            "/admin/portfolio/user/{id}/change/",
            get(change_form).post(update_profile),
        )
}

async fn list_accounts(
    State(svc): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<AccountView>>, ServiceError> {
    Ok(Json(svc.list_accounts(&identity, &params)?))
}

async fn change_form(
    State(svc): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<u64>,
) -> Result<Json<ChangeForm>, ServiceError> {
    Ok(Json(svc.open_change_form(&identity, id)?))
}

async fn update_profile(
    State(svc): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<u64>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<AccountView>, ServiceError> {
    Ok(Json(svc.update_profile(&identity, id, patch)?))
}
