use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use portfolio_core::{ListParams, ListResult, ServiceError};
use serde::{de, Deserialize, Deserializer};

use crate::api::AppState;
use crate::model::{AuditEntryView, Identity};

/// `?action_flag=1`. An empty value means no filter.
#[derive(Debug, Deserialize)]
struct AuditFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    action_flag: Option<u8>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/admin/logentry/", get(list_audit))
}

async fn list_audit(
    State(svc): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
    Query(filter): Query<AuditFilter>,
) -> Result<Json<ListResult<AuditEntryView>>, ServiceError> {
    Ok(Json(svc.list_audit(&identity, &params, filter.action_flag)?))
}
