use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A geographic point (WGS 84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// A registered identity with authentication and authorization flags.
///
/// This is the stored form and includes the password hash; API responses
/// use [`AccountView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, allocated from the account sequence.
    pub id: u64,

    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// argon2id PHC string. Empty means the account cannot log in.
    #[serde(default)]
    pub password_hash: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub is_staff: bool,

    /// Exempt from the staff guardrail and from permission checks.
    #[serde(default)]
    pub is_superuser: bool,

    /// Granted permission ids. A set, so granting twice is a no-op.
    #[serde(default)]
    pub permissions: BTreeSet<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub home_address: String,

    /// RFC 3339; filled by the store on first insert.
    #[serde(default)]
    pub date_joined: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// One-step registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Fields the change page may edit, in merge-patch form.
///
/// Unknown keys are rejected; read-only keys are stripped for
/// non-superusers before this is deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditableFields {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: BTreeSet<u64>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub home_address: String,
}

impl From<&Account> for EditableFields {
    fn from(a: &Account) -> Self {
        Self {
            username: a.username.clone(),
            email: a.email.clone(),
            is_active: a.is_active,
            is_staff: a.is_staff,
            is_superuser: a.is_superuser,
            permissions: a.permissions.clone(),
            location: a.location,
            phone_number: a.phone_number.clone(),
            home_address: a.home_address.clone(),
        }
    }
}

impl EditableFields {
    pub fn apply_to(self, account: &mut Account) {
        account.username = self.username;
        account.email = self.email;
        account.is_active = self.is_active;
        account.is_staff = self.is_staff;
        account.is_superuser = self.is_superuser;
        account.permissions = self.permissions;
        account.location = self.location;
        account.phone_number = self.phone_number;
        account.home_address = self.home_address;
    }
}

/// Fields a non-superuser sees but cannot change on the change page.
pub const STAFF_READONLY_FIELDS: &[&str] = &[
    "is_superuser",
    "permissions",
    "date_joined",
    "is_active",
    "last_login",
];

/// Public projection of an account (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub permissions: Vec<u64>,
    pub location: Option<Location>,
    pub phone_number: Option<String>,
    pub home_address: String,
    pub date_joined: String,
    pub last_login: Option<String>,
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            email: a.email.clone(),
            is_active: a.is_active,
            is_staff: a.is_staff,
            is_superuser: a.is_superuser,
            permissions: a.permissions.iter().copied().collect(),
            location: a.location,
            phone_number: a.phone_number.clone(),
            home_address: a.home_address.clone(),
            date_joined: a.date_joined.clone(),
            last_login: a.last_login.clone(),
        }
    }
}

/// Who is making a request, as resolved by the identity middleware.
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Authenticated { account: Account, session_id: String },
}

impl Identity {
    pub fn account(&self) -> Option<&Account> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { account, .. } => Some(account),
        }
    }
}
