//! Portfolio module: member accounts with an administrative area.
//!
//! # Resources
//!
//! - **Account**: login identity with staff/superuser flags, granted
//!   permissions, and optional location, phone number and home address
//! - **Permission**: named capability ("Can view user", ...)
//! - **AuditRecord**: append-only login/logout history
//! - **Session**: JWT issuance record, revoked on logout
//!
//! Non-superuser staff are confined to their own change page, the member
//! map, logout and password change; see [`policy::guardrail`]. Account
//! lifecycle side effects live in [`policy::lifecycle`].
//!
//! # Usage
//!
//! ```ignore
//! use portfolio::{PortfolioModule, service::PortfolioConfig};
//!
//! portfolio::service::permission::seed_defaults(&kv)?;
//! let module = PortfolioModule::new(kv, PortfolioConfig::default())?;
//! let router = module.routes(); // absolute paths, merge as-is
//! ```

pub mod api;
pub mod model;
pub mod policy;
pub mod service;

mod store_impls;

use std::sync::Arc;

use axum::Router;
use portfolio_core::{Module, ServiceError};
use portfolio_kv::KVStore;

use crate::service::{PortfolioConfig, PortfolioService};

/// Portfolio module implementing the Module trait.
pub struct PortfolioModule {
    service: Arc<PortfolioService>,
}

impl PortfolioModule {
    /// Create the module. Fails if the required permissions are not seeded.
    pub fn new(kv: Arc<dyn KVStore>, config: PortfolioConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            service: PortfolioService::new(kv, config)?,
        })
    }

    pub fn service(&self) -> &Arc<PortfolioService> {
        &self.service
    }
}

impl Module for PortfolioModule {
    fn name(&self) -> &str {
        "portfolio"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
