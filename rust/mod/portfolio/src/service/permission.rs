use std::sync::Arc;

use portfolio_core::ServiceError;
use portfolio_kv::KVStore;
use portfolio_store::KvOps;
use tracing::info;

use crate::model::{Account, Permission, RequiredPermissions, CHANGE_USER, DEFAULT_PERMISSIONS, VIEW_USER};
use crate::service::PortfolioService;

/// Insert any default permission that is not yet registered (by name).
/// Returns how many were created.
pub fn seed_defaults(kv: &Arc<dyn KVStore>) -> Result<usize, ServiceError> {
    let ops = KvOps::<Permission>::new(Arc::clone(kv));
    let existing = ops.list()?;

    let mut missing = Vec::new();
    for (name, codename) in DEFAULT_PERMISSIONS {
        if existing.iter().any(|p| p.name == *name) {
            continue;
        }
        missing.push(Permission {
            id: ops.next_id()?,
            name: name.to_string(),
            codename: codename.to_string(),
        });
    }
    ops.save_all(&missing)?;

    let created = missing.len();
    if created > 0 {
        info!("seeded {} permissions", created);
    }
    Ok(created)
}

/// Resolve "Can view user" and "Can change user" by name.
pub(crate) fn resolve_required(
    ops: &KvOps<Permission>,
) -> Result<RequiredPermissions, ServiceError> {
    let all = ops.list()?;
    let by_name = |name: &str| {
        all.iter().find(|p| p.name == name).map(|p| p.id).ok_or_else(|| {
            ServiceError::Configuration(format!(
                "permission '{}' is not registered; seed the permission registry first",
                name
            ))
        })
    };
    Ok(RequiredPermissions {
        view_user: by_name(VIEW_USER)?,
        change_user: by_name(CHANGE_USER)?,
    })
}

impl PortfolioService {
    pub fn list_permissions(&self) -> Result<Vec<Permission>, ServiceError> {
        self.permissions.list()
    }

    /// Whether `account` holds the permission with this codename.
    ///
    /// Active superusers hold every permission; inactive accounts hold none.
    pub fn has_perm(&self, account: &Account, codename: &str) -> Result<bool, ServiceError> {
        if !account.is_active {
            return Ok(false);
        }
        if account.is_superuser {
            return Ok(true);
        }
        let permission = self.permissions.find(|p| p.codename == codename)?;
        Ok(permission.is_some_and(|p| account.permissions.contains(&p.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::harness;

    #[test]
    fn seeding_is_idempotent() {
        let h = harness();
        assert_eq!(seed_defaults(&h.kv).unwrap(), 0);
        assert_eq!(h.svc.list_permissions().unwrap().len(), DEFAULT_PERMISSIONS.len());
    }

    #[test]
    fn required_ids_match_names() {
        let h = harness();
        let required = h.svc.auditor.required();
        let all = h.svc.list_permissions().unwrap();
        let name_of = |id: u64| all.iter().find(|p| p.id == id).unwrap().name.clone();
        assert_eq!(name_of(required.view_user), "Can view user");
        assert_eq!(name_of(required.change_user), "Can change user");
    }

    #[test]
    fn has_perm_rules() {
        let h = harness();
        let root = h.account("root", true, true, true);
        assert!(h.svc.has_perm(&root, "delete_user").unwrap());

        // Updates grant view/change.
        let inactive = h.account("dormant", false, false, false);
        let inactive = h.svc.get_account(inactive.id).unwrap();
        assert_eq!(inactive.permissions.len(), 2);
        assert!(!h.svc.has_perm(&inactive, "view_user").unwrap());

        let mut active = inactive.clone();
        active.is_active = true;
        assert!(h.svc.has_perm(&active, "view_user").unwrap());
        assert!(h.svc.has_perm(&active, "change_user").unwrap());
        assert!(!h.svc.has_perm(&active, "delete_user").unwrap());
        assert!(!h.svc.has_perm(&active, "no_such_codename").unwrap());
    }
}
