//! Route registration: module routes plus system endpoints.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use portfolio_core::Module;
use tracing::info;

/// Build the complete router.
///
/// Module routers already carry their state and absolute paths, so they
/// are merged rather than nested.
pub fn build_router(modules: &[&dyn Module]) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for module in modules {
        info!("Mounting {} routes", module.name());
        app = app.merge(module.routes());
    }
    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "portfoliod",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use portfolio::service::{permission, PortfolioConfig};
    use portfolio::PortfolioModule;
    use portfolio_kv::KVStore;
    use tower::ServiceExt;

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn system_and_module_routes() {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> =
            Arc::new(portfolio_kv::RedbStore::open(&dir.path().join("data.redb")).unwrap());
        permission::seed_defaults(&kv).unwrap();
        let module = PortfolioModule::new(kv, PortfolioConfig::default()).unwrap();
        let app = build_router(&[&module]);

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (_, body) = get_json(&app, "/version").await;
        assert_eq!(body["name"], "portfoliod");

        let (status, body) = get_json(&app, "/admin/portfolio/user/viewmap").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }
}
