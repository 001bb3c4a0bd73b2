use axum::Router;

/// A service module that contributes HTTP routes.
///
/// Unlike a prefixed API, portfolio modules own absolute paths (the
/// administrative area lives under `/admin/...`), so the binary merges
/// each module's router as-is instead of nesting it.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes with their state already applied.
    fn routes(&self) -> Router;
}
