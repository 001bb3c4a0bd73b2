use argon2::Argon2;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use portfolio_core::{new_id, now_rfc3339, ServiceError};
use tracing::{info, warn};

use crate::model::{
    Account, Claims, Identity, LoginRequest, NewAccount, PasswordChangeRequest, RegisterRequest,
    Session, TokenResponse,
};
use crate::service::account::validate_email;
use crate::service::{require_account, PortfolioService};

const PASSWORD_MIN: usize = 8;

/// Verified against when the username is unknown. Same argon2id cost as
/// [`hash_password`]; no password matches it.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash a password as an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn validate_new_password(password1: &str, password2: &str) -> Result<(), ServiceError> {
    if password1 != password2 {
        return Err(ServiceError::Validation("the two password fields didn't match".into()));
    }
    if password1.chars().count() < PASSWORD_MIN {
        return Err(ServiceError::Validation(format!(
            "password must contain at least {} characters",
            PASSWORD_MIN
        )));
    }
    Ok(())
}

impl PortfolioService {
    /// One-step registration: create an active account, then log it in.
    pub fn register(&self, input: RegisterRequest) -> Result<TokenResponse, ServiceError> {
        validate_email(&input.email)?;
        validate_new_password(&input.password1, &input.password2)?;
        let account = self.create_account(NewAccount {
            username: input.username,
            email: Some(input.email),
            password_hash: hash_password(&input.password1)?,
            is_active: true,
            is_staff: false,
            is_superuser: false,
        })?;
        self.complete_login(account)
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail
    /// the same way, after one password verification, and dispatch the
    /// login-failure handler.
    pub fn login(&self, input: &LoginRequest) -> Result<TokenResponse, ServiceError> {
        let account = match self.find_by_username(&input.username)? {
            Some(account) => Some(account)
                .filter(|a| verify_password(&input.password, &a.password_hash) && a.is_active),
            None => {
                // Spend the same hashing work as a real check.
                verify_password(&input.password, DUMMY_HASH);
                None
            }
        };

        match account {
            Some(account) => self.complete_login(account),
            None => {
                self.auditor.on_login_failed(&input.username);
                Err(ServiceError::Unauthorized("invalid credentials".into()))
            }
        }
    }

    /// Stamp `last_login` (a normal save), issue the token, then record
    /// the login.
    fn complete_login(&self, mut account: Account) -> Result<TokenResponse, ServiceError> {
        account.last_login = Some(now_rfc3339());
        let account = self.save_account(account)?;
        let token = self.issue_token(&account)?;
        self.append_audit(self.auditor.on_login(&account))?;
        info!(id = account.id, username = %account.username, "login");
        Ok(token)
    }

    /// Revoke the current session and record the logout.
    ///
    /// Logging out without a session is a no-op.
    pub fn logout(&self, identity: &Identity) -> Result<(), ServiceError> {
        if let Identity::Authenticated { session_id, .. } = identity {
            self.revoke_session(session_id)?;
        }
        if let Some(draft) = self.auditor.on_logout(identity.account()) {
            self.append_audit(draft)?;
        }
        Ok(())
    }

    pub fn change_password(
        &self,
        identity: &Identity,
        input: &PasswordChangeRequest,
    ) -> Result<(), ServiceError> {
        let current = require_account(identity)?;
        let mut account = self.get_account(current.id)?;
        if !verify_password(&input.old_password, &account.password_hash) {
            return Err(ServiceError::Validation(
                "your old password was entered incorrectly".into(),
            ));
        }
        validate_new_password(&input.new_password1, &input.new_password2)?;
        account.password_hash = hash_password(&input.new_password1)?;
        self.save_account(account)?;
        Ok(())
    }

    // ── Tokens ──

    /// Create a session and sign a bearer token for it.
    pub fn issue_token(&self, account: &Account) -> Result<TokenResponse, ServiceError> {
        let now = chrono::Utc::now();
        let exp = chrono::Duration::try_seconds(self.config.token_ttl)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                ServiceError::Configuration(format!(
                    "token ttl {} is out of range",
                    self.config.token_ttl
                ))
            })?;

        let session = self.sessions.save_new(Session {
            id: new_id(),
            account_id: account.id,
            issued_at: now.to_rfc3339(),
            expires_at: exp.to_rfc3339(),
            revoked: false,
        })?;

        let claims = Claims {
            sub: account.id.to_string(),
            name: account.username.clone(),
            sid: session.id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {}", e)))?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl,
            account_id: account.id,
        })
    }

    /// Resolve a bearer token to the requesting identity.
    ///
    /// The token must verify, its session must be live, and the account
    /// must still exist and be active. The account is read fresh so flag
    /// changes take effect on the next request.
    pub fn authenticate_token(&self, token: &str) -> Result<Identity, ServiceError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?
        .claims;

        let session = self
            .sessions
            .get(&claims.sid)?
            .ok_or_else(|| ServiceError::Unauthorized("unknown session".into()))?;
        if session.revoked {
            return Err(ServiceError::Unauthorized("session has been revoked".into()));
        }

        if claims.sub != session.account_id.to_string() {
            return Err(ServiceError::Unauthorized("token subject mismatch".into()));
        }
        let account = self
            .accounts
            .get(&claims.sub)?
            .ok_or_else(|| ServiceError::Unauthorized("account no longer exists".into()))?;
        if !account.is_active {
            return Err(ServiceError::Unauthorized("account is inactive".into()));
        }

        Ok(Identity::Authenticated {
            account,
            session_id: session.id,
        })
    }

    fn revoke_session(&self, session_id: &str) -> Result<(), ServiceError> {
        match self.sessions.get(session_id)? {
            Some(mut session) => {
                session.revoked = true;
                self.sessions.save(session)?;
            }
            None => warn!(session_id, "logout for unknown session"),
        }
        Ok(())
    }
}
