use serde::{Deserialize, Serialize};

/// A named capability that can be granted to accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: u64,

    /// Human-readable name, e.g. "Can view user". Unique.
    pub name: String,

    /// Machine name used by permission checks, e.g. `view_user`.
    pub codename: String,
}

/// Permissions the registry is seeded with: `(name, codename)`.
pub const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("Can add user", "add_user"),
    ("Can change user", "change_user"),
    ("Can delete user", "delete_user"),
    ("Can view user", "view_user"),
    ("Can view log entry", "view_logentry"),
];

pub const VIEW_USER: &str = "Can view user";
pub const CHANGE_USER: &str = "Can change user";

/// The two permissions the lifecycle auditor grants, resolved to ids
/// once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredPermissions {
    pub view_user: u64,
    pub change_user: u64,
}

impl RequiredPermissions {
    pub fn ids(&self) -> [u64; 2] {
        [self.view_user, self.change_user]
    }
}
