//! Account lifecycle auditor.
//!
//! The account service calls these handlers synchronously at four points:
//! after every account save, after a successful login, after a failed
//! login and on logout. Handlers only decide; the service applies the
//! returned mutations and writes the returned audit drafts.

use tracing::info;

use crate::model::{Account, ActionKind, AuditDraft, RequiredPermissions, LOGENTRY_TYPE};

/// A change the auditor wants applied to a saved account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PromoteToStaff,
    Grant(Vec<u64>),
}

impl Mutation {
    /// Apply to `account`; returns whether anything changed.
    pub fn apply(&self, account: &mut Account) -> bool {
        match self {
            Mutation::PromoteToStaff => !std::mem::replace(&mut account.is_staff, true),
            Mutation::Grant(ids) => ids
                .iter()
                .fold(false, |changed, id| account.permissions.insert(*id) | changed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Auditor {
    required: RequiredPermissions,
}

impl Auditor {
    pub fn new(required: RequiredPermissions) -> Self {
        Self { required }
    }

    pub fn required(&self) -> RequiredPermissions {
        self.required
    }

    /// After an account is persisted.
    ///
    /// A freshly created active account is promoted to staff and nothing
    /// else. Every other save (updates, and creation of an inactive
    /// account) grants "Can view user" and "Can change user".
    pub fn after_save(&self, account: &Account, created: bool) -> Vec<Mutation> {
        if created && account.is_active {
            if account.is_staff {
                return Vec::new();
            }
            return vec![Mutation::PromoteToStaff];
        }
        vec![Mutation::Grant(self.required.ids().to_vec())]
    }

    /// After a successful login. Always recorded as `Created`.
    pub fn on_login(&self, account: &Account) -> AuditDraft {
        session_entry(account, ActionKind::Created)
    }

    /// After a failed login. Logged only; the password is never passed in.
    pub fn on_login_failed(&self, username: &str) {
        info!(username = %username, "user logged in failed");
    }

    /// On logout. Always recorded as `Deleted`; an anonymous logout
    /// records nothing.
    pub fn on_logout(&self, account: Option<&Account>) -> Option<AuditDraft> {
        account.map(|a| session_entry(a, ActionKind::Deleted))
    }
}

fn session_entry(account: &Account, action_kind: ActionKind) -> AuditDraft {
    AuditDraft {
        actor_id: account.id,
        target_entity_type: LOGENTRY_TYPE,
        target_id: account.id,
        display_text: account.username.clone(),
        action_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const REQUIRED: RequiredPermissions = RequiredPermissions {
        view_user: 4,
        change_user: 2,
    };

    fn account(id: u64, is_active: bool, is_staff: bool) -> Account {
        Account {
            id,
            username: format!("user{}", id),
            email: None,
            password_hash: String::new(),
            is_active,
            is_staff,
            is_superuser: false,
            permissions: BTreeSet::new(),
            location: None,
            phone_number: None,
            home_address: String::new(),
            date_joined: String::new(),
            last_login: None,
        }
    }

    #[test]
    fn new_active_account_is_promoted_without_grants() {
        let auditor = Auditor::new(REQUIRED);
        let mut acc = account(1, true, false);
        let mutations = auditor.after_save(&acc, true);
        assert_eq!(mutations, vec![Mutation::PromoteToStaff]);

        for m in &mutations {
            m.apply(&mut acc);
        }
        assert!(acc.is_staff);
        assert!(acc.permissions.is_empty());
    }

    #[test]
    fn new_active_staff_needs_nothing() {
        let auditor = Auditor::new(REQUIRED);
        assert!(auditor.after_save(&account(1, true, true), true).is_empty());
    }

    #[test]
    fn new_inactive_account_gets_grants() {
        let auditor = Auditor::new(REQUIRED);
        assert_eq!(
            auditor.after_save(&account(1, false, false), true),
            vec![Mutation::Grant(vec![4, 2])]
        );
    }

    #[test]
    fn update_of_inactive_account_grants_and_leaves_staff_alone() {
        let auditor = Auditor::new(REQUIRED);
        let mut acc = account(9, false, false);
        for m in auditor.after_save(&acc, false) {
            m.apply(&mut acc);
        }
        assert_eq!(acc.permissions, BTreeSet::from([2, 4]));
        assert!(!acc.is_staff);
    }

    #[test]
    fn grant_is_idempotent() {
        let mut acc = account(1, true, true);
        let grant = Mutation::Grant(vec![4, 2]);
        assert!(grant.apply(&mut acc));
        assert!(!grant.apply(&mut acc));
        assert_eq!(acc.permissions.len(), 2);
    }

    #[test]
    fn promotion_reports_change_once() {
        let mut acc = account(1, true, false);
        assert!(Mutation::PromoteToStaff.apply(&mut acc));
        assert!(!Mutation::PromoteToStaff.apply(&mut acc));
    }

    #[test]
    fn login_and_logout_entries() {
        let auditor = Auditor::new(REQUIRED);
        let acc = account(3, true, true);

        let login = auditor.on_login(&acc);
        assert_eq!(login.actor_id, 3);
        assert_eq!(login.target_id, 3);
        assert_eq!(login.target_entity_type, "logentry");
        assert_eq!(login.display_text, "user3");
        assert_eq!(login.action_kind, ActionKind::Created);

        let logout = auditor.on_logout(Some(&acc)).unwrap();
        assert_eq!(logout.action_kind, ActionKind::Deleted);
        assert_eq!(logout.actor_id, 3);

        assert!(auditor.on_logout(None).is_none());
    }
}
