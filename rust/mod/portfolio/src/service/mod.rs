pub mod account;
pub mod audit;
pub mod map;
pub mod permission;
pub mod session;

use std::sync::Arc;

use portfolio_core::ServiceError;
use portfolio_kv::KVStore;
use portfolio_store::KvOps;
use tracing::info;

use crate::model::{Account, AuditRecord, Identity, Permission, Session};
use crate::policy::Auditor;

/// Longest accepted token lifetime, in seconds (ten years).
pub const MAX_TOKEN_TTL: i64 = 315_360_000;

/// Configuration for the portfolio service.
#[derive(Debug, Clone)]
pub struct PortfolioConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 24h).
    pub token_ttl: i64,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "portfolio-dev-secret-change-me".to_string(),
            token_ttl: 86400,
        }
    }
}

/// Accounts, permissions, sessions and the audit log, plus the lifecycle
/// auditor that reacts to their events.
pub struct PortfolioService {
    pub(crate) accounts: KvOps<Account>,
    pub(crate) permissions: KvOps<Permission>,
    pub(crate) audit: KvOps<AuditRecord>,
    pub(crate) sessions: KvOps<Session>,
    pub(crate) auditor: Auditor,
    pub(crate) config: PortfolioConfig,
}

impl PortfolioService {
    /// Create the service, resolving the permissions the auditor grants.
    ///
    /// Fails with `ServiceError::Configuration` when the token ttl is out
    /// of range, or when the registry lacks "Can view user" or "Can change
    /// user", so a missing seed stops the server at boot instead of at the
    /// first account save.
    pub fn new(kv: Arc<dyn KVStore>, config: PortfolioConfig) -> Result<Arc<Self>, ServiceError> {
        if !(1..=MAX_TOKEN_TTL).contains(&config.token_ttl) {
            return Err(ServiceError::Configuration(format!(
                "token ttl must be between 1 and {} seconds, got {}",
                MAX_TOKEN_TTL, config.token_ttl
            )));
        }
        let permissions = KvOps::<Permission>::new(Arc::clone(&kv));
        let required = permission::resolve_required(&permissions)?;
        info!(
            view_user = required.view_user,
            change_user = required.change_user,
            "resolved lifecycle permissions"
        );

        Ok(Arc::new(Self {
            accounts: KvOps::new(Arc::clone(&kv)),
            permissions,
            audit: KvOps::new(Arc::clone(&kv)),
            sessions: KvOps::new(kv),
            auditor: Auditor::new(required),
            config,
        }))
    }
}

/// The requester's account, or 401 for anonymous requests.
pub(crate) fn require_account(identity: &Identity) -> Result<&Account, ServiceError> {
    identity
        .account()
        .ok_or_else(|| ServiceError::Unauthorized("authentication required".into()))
}

/// The requester's account if it may enter the administrative area.
pub(crate) fn require_staff(identity: &Identity) -> Result<&Account, ServiceError> {
    let account = require_account(identity)?;
    if !(account.is_active && account.is_staff) {
        return Err(ServiceError::PermissionDenied(
            "staff access required".into(),
        ));
    }
    Ok(account)
}
