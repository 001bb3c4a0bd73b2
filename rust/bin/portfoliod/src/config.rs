//! Server configuration, loaded from `/etc/portfolio/<name>.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    /// Account created at start-up if its username is not taken.
    #[serde(default)]
    pub superuser: Option<SuperuserConfig>,
    #[serde(default)]
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

fn default_expire_secs() -> i64 {
    86400
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuperuserConfig {
    pub username: String,
    /// argon2id PHC string; see `portfoliod hash-password`.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionsConfig {
    /// Register the default user permissions on start-up.
    #[serde(default = "default_true")]
    pub seed: bool,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self { seed: true }
    }
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// A bare name maps to `/etc/portfolio/<name>.toml`; anything with a
    /// `/` or `.` is used as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/portfolio/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Ok(toml::from_str(&content)?)
    }
}
