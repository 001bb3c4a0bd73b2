use portfolio_core::{merge_patch, ListParams, ListResult, ServiceError};
use tracing::{debug, info};

use crate::model::{
    Account, AccountView, EditableFields, Identity, NewAccount, STAFF_READONLY_FIELDS,
};
use crate::service::{require_staff, PortfolioService};

const USERNAME_MAX: usize = 150;
const PHONE_MIN: usize = 10;
const PHONE_MAX: usize = 15;
const ADDRESS_MAX: usize = 500;

/// The change page as served to a viewer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChangeForm {
    pub account: AccountView,
    /// Fields the viewer may not edit.
    pub readonly_fields: Vec<&'static str>,
}

impl PortfolioService {
    // ── Persistence with lifecycle hooks ──

    /// Create an account and run the after-save hook with `created = true`.
    pub fn create_account(&self, input: NewAccount) -> Result<Account, ServiceError> {
        validate_username(&input.username)?;

        let account = Account {
            id: self.accounts.next_id()?,
            username: input.username,
            email: input.email.filter(|e| !e.is_empty()),
            password_hash: input.password_hash,
            is_active: input.is_active,
            is_staff: input.is_staff,
            is_superuser: input.is_superuser,
            permissions: Default::default(),
            location: None,
            phone_number: None,
            home_address: String::new(),
            date_joined: String::new(),
            last_login: None,
        };
        let account = self.accounts.save_new(account)?;
        info!(id = account.id, username = %account.username, "account created");
        self.after_save(account, true)
    }

    /// Persist changes to an existing account and run the after-save hook
    /// with `created = false`.
    pub fn save_account(&self, account: Account) -> Result<Account, ServiceError> {
        let account = self.accounts.save(account)?;
        self.after_save(account, false)
    }

    /// Apply the auditor's mutations. The resulting second write goes
    /// straight to the store, so it does not dispatch the hook again.
    fn after_save(&self, mut account: Account, created: bool) -> Result<Account, ServiceError> {
        let mut changed = false;
        for mutation in self.auditor.after_save(&account, created) {
            debug!(id = account.id, ?mutation, "applying lifecycle mutation");
            changed |= mutation.apply(&mut account);
        }
        if !changed {
            return Ok(account);
        }
        info!(
            id = account.id,
            is_staff = account.is_staff,
            permissions = account.permissions.len(),
            "account updated by lifecycle hook"
        );
        self.accounts.save(account)
    }

    // ── Lookup ──

    pub fn get_account(&self, id: u64) -> Result<Account, ServiceError> {
        self.accounts.get_or_err(&id.to_string())
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>, ServiceError> {
        self.accounts.find_unique("username", username)
    }

    /// All accounts ordered by id.
    pub(crate) fn all_accounts(&self) -> Result<Vec<Account>, ServiceError> {
        let mut all = self.accounts.list()?;
        all.sort_by_key(|a| a.id);
        Ok(all)
    }

    /// Create the configured superuser unless the username already exists.
    /// Returns true when an account was created.
    pub fn ensure_superuser(&self, username: &str, password_hash: &str) -> Result<bool, ServiceError> {
        if self.find_by_username(username)?.is_some() {
            return Ok(false);
        }
        self.create_account(NewAccount {
            username: username.to_string(),
            email: None,
            password_hash: password_hash.to_string(),
            is_active: true,
            is_staff: true,
            is_superuser: true,
        })?;
        Ok(true)
    }

    // ── Admin pages ──

    /// The account change list. Superusers see every account, other staff
    /// only themselves.
    pub fn list_accounts(
        &self,
        identity: &Identity,
        params: &ListParams,
    ) -> Result<ListResult<AccountView>, ServiceError> {
        let viewer = require_staff(identity)?;
        if !(self.has_perm(viewer, "view_user")? || self.has_perm(viewer, "change_user")?) {
            return Err(ServiceError::PermissionDenied(
                "requires 'view_user' or 'change_user'".into(),
            ));
        }

        let visible: Vec<AccountView> = self
            .all_accounts()?
            .iter()
            .filter(|a| viewer.is_superuser || a.id == viewer.id)
            .map(AccountView::from)
            .collect();
        Ok(params.page(visible))
    }

    /// Open the change page for account `id`.
    ///
    /// Opening the page first touches the target account: an active
    /// non-staff account is promoted and saved (which runs the save hook);
    /// any other account is granted "Can change user" and "Can view user"
    /// directly. Only then are the viewer's permissions and visibility
    /// checked.
    pub fn open_change_form(&self, identity: &Identity, id: u64) -> Result<ChangeForm, ServiceError> {
        let viewer = require_staff(identity)?;

        let mut target = self.get_account(id)?;
        if target.is_active && !target.is_staff {
            target.is_staff = true;
            target = self.save_account(target)?;
        } else {
            let before = target.permissions.len();
            target.permissions.extend(self.auditor.required().ids());
            if target.permissions.len() != before {
                target = self.accounts.save(target)?;
            }
        }

        // The viewer may be the target, so re-read its permissions.
        let viewer = if viewer.id == target.id { &target } else { viewer };
        if !(self.has_perm(viewer, "view_user")? || self.has_perm(viewer, "change_user")?) {
            return Err(ServiceError::PermissionDenied(
                "requires 'view_user' or 'change_user'".into(),
            ));
        }
        if !viewer.is_superuser && viewer.id != target.id {
            return Err(ServiceError::NotFound(format!("account '{}' not found", id)));
        }

        Ok(ChangeForm {
            account: AccountView::from(&target),
            readonly_fields: readonly_fields(viewer),
        })
    }

    /// Apply a merge-patch from the change page.
    ///
    /// Read-only fields are dropped from the patch for non-superusers.
    pub fn update_profile(
        &self,
        identity: &Identity,
        id: u64,
        patch: serde_json::Value,
    ) -> Result<AccountView, ServiceError> {
        let viewer = require_staff(identity)?;
        if !self.has_perm(viewer, "change_user")? {
            return Err(ServiceError::PermissionDenied("requires 'change_user'".into()));
        }
        if !viewer.is_superuser && viewer.id != id {
            return Err(ServiceError::NotFound(format!("account '{}' not found", id)));
        }
        let mut patch = patch;
        let Some(fields) = patch.as_object_mut() else {
            return Err(ServiceError::Validation("patch must be a JSON object".into()));
        };
        for field in readonly_fields(viewer) {
            if fields.remove(field).is_some() {
                debug!(id, field, "dropping read-only field from patch");
            }
        }

        let mut account = self.get_account(id)?;
        let mut base = serde_json::to_value(EditableFields::from(&account))
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        merge_patch(&mut base, &patch);
        let edited: EditableFields = serde_json::from_value(base)
            .map_err(|e| ServiceError::Validation(format!("invalid change: {}", e)))?;
        validate_fields(&edited)?;

        if let Some(unknown) = self.unknown_permission(&edited)? {
            return Err(ServiceError::Validation(format!("unknown permission id {}", unknown)));
        }

        edited.apply_to(&mut account);
        let saved = self.save_account(account)?;
        Ok(AccountView::from(&saved))
    }

    fn unknown_permission(&self, edited: &EditableFields) -> Result<Option<u64>, ServiceError> {
        let known: Vec<u64> = self.permissions.list()?.iter().map(|p| p.id).collect();
        Ok(edited.permissions.iter().copied().find(|id| !known.contains(id)))
    }
}

fn readonly_fields(viewer: &Account) -> Vec<&'static str> {
    if viewer.is_superuser {
        Vec::new()
    } else {
        STAFF_READONLY_FIELDS.to_vec()
    }
}

pub(crate) fn validate_username(username: &str) -> Result<(), ServiceError> {
    if username.is_empty() {
        return Err(ServiceError::Validation("username is required".into()));
    }
    if username.chars().count() > USERNAME_MAX {
        return Err(ServiceError::Validation(format!(
            "username must be at most {} characters",
            USERNAME_MAX
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(ServiceError::Validation(
            "username may contain only letters, digits and @/./+/-/_".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ServiceError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ServiceError::Validation("enter a valid email address".into())),
    }
}

fn validate_fields(fields: &EditableFields) -> Result<(), ServiceError> {
    validate_username(&fields.username)?;
    if let Some(email) = fields.email.as_deref().filter(|e| !e.is_empty()) {
        validate_email(email)?;
    }
    if let Some(phone) = fields.phone_number.as_deref() {
        let len = phone.chars().count();
        if !(PHONE_MIN..=PHONE_MAX).contains(&len) {
            return Err(ServiceError::Validation(format!(
                "phone_number must be {} to {} characters",
                PHONE_MIN, PHONE_MAX
            )));
        }
    }
    if fields.home_address.chars().count() > ADDRESS_MAX {
        return Err(ServiceError::Validation(format!(
            "home_address must be at most {} characters",
            ADDRESS_MAX
        )));
    }
    if let Some(loc) = fields.location {
        if !(-90.0..=90.0).contains(&loc.latitude) || !(-180.0..=180.0).contains(&loc.longitude) {
            return Err(ServiceError::Validation(
                "location must have latitude in [-90, 90] and longitude in [-180, 180]".into(),
            ));
        }
    }
    Ok(())
}
