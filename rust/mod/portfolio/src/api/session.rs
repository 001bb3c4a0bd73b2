use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Extension, Json, Router};
use portfolio_core::ServiceError;

use crate::api::AppState;
use crate::model::{Identity, LoginRequest, PasswordChangeRequest, RegisterRequest, TokenResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(register))
        .route("/admin/login/", post(login))
        .route("/admin/logout/", post(logout))
        .route("/admin/password_change/", post(change_password))
}

async fn register(
    State(svc): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ServiceError> {
    let token = svc.register(input)?;
    Ok((StatusCode::CREATED, Json(token)))
}

async fn login(
    State(svc): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    Ok(Json(svc.login(&input)?))
}

async fn logout(
    State(svc): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<StatusCode, ServiceError> {
    svc.logout(&identity)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_password(
    State(svc): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(input): Json<PasswordChangeRequest>,
) -> Result<StatusCode, ServiceError> {
    svc.change_password(&identity, &input)?;
    Ok(StatusCode::NO_CONTENT)
}
