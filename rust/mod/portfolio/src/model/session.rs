use serde::{Deserialize, Serialize};

/// A login session. The bearer token is only valid while its session is
/// present and not revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Random id (UUIDv4, no dashes), carried in the token as `sid`.
    pub id: String,

    pub account_id: u64,

    /// RFC 3339 timestamp when the token was issued.
    pub issued_at: String,

    /// RFC 3339 timestamp when the token expires.
    pub expires_at: String,

    #[serde(default)]
    pub revoked: bool,
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: account id.
    pub sub: String,

    /// Username at issue time.
    pub name: String,

    /// Session id (for revocation on logout).
    pub sid: String,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

/// Token returned after login or registration.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub account_id: u64,
}
