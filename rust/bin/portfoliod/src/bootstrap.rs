//! Bootstrap: start-up checks and seed data.
//!
//! When portfoliod starts:
//! 1. Verify the config (JWT secret, data dir, superuser hash) or refuse
//!    to start.
//! 2. Seed the default permissions unless disabled.
//! 3. Create the configured superuser if its username is free.

use std::sync::Arc;

use password_hash::PasswordHash;
use portfolio::service::{permission, PortfolioService, MAX_TOKEN_TTL};
use portfolio_kv::KVStore;
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration is ready for use.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!("JWT secret is empty in configuration.");
    }
    if config.jwt.expire_secs <= 0 {
        anyhow::bail!("JWT expire_secs must be positive.");
    }
    if config.jwt.expire_secs > MAX_TOKEN_TTL {
        anyhow::bail!("JWT expire_secs must not exceed {} (ten years).", MAX_TOKEN_TTL);
    }
    if config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if let Some(su) = &config.superuser {
        if su.username.is_empty() {
            anyhow::bail!("Superuser username is empty in configuration.");
        }
        if PasswordHash::new(&su.password_hash).is_err() {
            anyhow::bail!(
                "Superuser password_hash is not a valid PHC string.\n\
                 Run `portfoliod hash-password <password>` to generate one."
            );
        }
    }
    Ok(())
}

/// Register the default permissions if seeding is enabled.
pub fn seed_permissions(kv: &Arc<dyn KVStore>, config: &ServerConfig) -> anyhow::Result<()> {
    if !config.permissions.seed {
        info!("Permission seeding disabled");
        return Ok(());
    }
    let created = permission::seed_defaults(kv)?;
    info!("Permission registry ready ({} new)", created);
    Ok(())
}

/// Create the configured superuser account if missing.
pub fn ensure_superuser(svc: &PortfolioService, config: &ServerConfig) -> anyhow::Result<()> {
    let Some(su) = &config.superuser else {
        return Ok(());
    };
    if svc.ensure_superuser(&su.username, &su.password_hash)? {
        info!(username = %su.username, "Created superuser");
    } else {
        info!(username = %su.username, "Superuser already exists");
    }
    Ok(())
}
