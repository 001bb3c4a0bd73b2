//! Staff access guardrail.
//!
//! Staff accounts that are not superusers may only visit four pages of the
//! administrative area: their own change page, the map, logout and
//! password change. Any other admin-area request is redirected to their
//! own change page before the handler runs.

use crate::model::Account;

pub const VIEW_MAP_PATH: &str = "/admin/portfolio/user/viewmap";
pub const LOGOUT_PATH: &str = "/admin/logout/";
pub const PASSWORD_CHANGE_PATH: &str = "/admin/password_change/";

/// Outcome of the guardrail for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Short-circuit with a redirect to this path.
    Redirect(String),
}

/// The account's own profile-change page.
pub fn change_page(account_id: u64) -> String {
    format!("/admin/portfolio/user/{}/change/", account_id)
}

/// Admin paths a staff account may visit without being redirected.
pub fn allowed_paths(account_id: u64) -> [String; 4] {
    [
        change_page(account_id),
        VIEW_MAP_PATH.to_string(),
        LOGOUT_PATH.to_string(),
        PASSWORD_CHANGE_PATH.to_string(),
    ]
}

/// Decide whether `requester` may reach the handler for `path`.
///
/// `None` is an anonymous requester. Matching is on the raw path: the
/// admin area is any path containing "admin", and allow-list entries must
/// match exactly (no trailing-slash normalization).
pub fn decide(requester: Option<&Account>, path: &str) -> Decision {
    let Some(account) = requester else {
        return Decision::Allow;
    };
    if account.is_superuser {
        return Decision::Allow;
    }
    if account.is_staff && path.contains("admin") {
        if allowed_paths(account.id).iter().any(|p| p == path) {
            return Decision::Allow;
        }
        return Decision::Redirect(change_page(account.id));
    }
    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn account(id: u64, is_staff: bool, is_superuser: bool) -> Account {
        Account {
            id,
            username: format!("user{}", id),
            email: None,
            password_hash: String::new(),
            is_active: true,
            is_staff,
            is_superuser,
            permissions: BTreeSet::new(),
            location: None,
            phone_number: None,
            home_address: String::new(),
            date_joined: String::new(),
            last_login: None,
        }
    }

    const PATHS: &[&str] = &[
        "/",
        "/register/",
        "/admin/",
        "/admin/login/",
        "/admin/logout/",
        "/admin/password_change/",
        "/admin/portfolio/user/",
        "/admin/portfolio/user/7/change/",
        "/admin/portfolio/user/8/change/",
        "/admin/portfolio/user/viewmap",
        "/admin/portfolio/user/viewmap/",
        "/admin/admin/logentry/",
        "/badminton",
    ];

    #[test]
    fn anonymous_and_superusers_are_never_redirected() {
        let root = account(1, true, true);
        let bare_super = account(2, false, true);
        for path in PATHS {
            assert_eq!(decide(None, path), Decision::Allow, "anonymous {}", path);
            assert_eq!(decide(Some(&root), path), Decision::Allow, "superuser {}", path);
            assert_eq!(decide(Some(&bare_super), path), Decision::Allow, "superuser {}", path);
        }
    }

    #[test]
    fn non_staff_accounts_fall_through() {
        let member = account(3, false, false);
        for path in PATHS {
            assert_eq!(decide(Some(&member), path), Decision::Allow, "{}", path);
        }
    }

    #[test]
    fn staff_outside_admin_area_pass() {
        let staff = account(7, true, false);
        for path in ["/", "/register/", "/accounts/profile/", "/static/site.css"] {
            assert_eq!(decide(Some(&staff), path), Decision::Allow, "{}", path);
        }
    }

    #[test]
    fn staff_reach_exactly_the_allow_list() {
        let staff = account(7, true, false);
        for path in PATHS.iter().filter(|p| p.contains("admin")) {
            let expected = if allowed_paths(7).iter().any(|a| a == path) {
                Decision::Allow
            } else {
                Decision::Redirect("/admin/portfolio/user/7/change/".to_string())
            };
            assert_eq!(decide(Some(&staff), path), expected, "{}", path);
        }
    }

    #[test]
    fn own_change_page_passes() {
        let staff = account(7, true, false);
        assert_eq!(
            decide(Some(&staff), "/admin/portfolio/user/7/change/"),
            Decision::Allow
        );
    }

    #[test]
    fn foreign_admin_page_redirects_home() {
        let staff = account(7, true, false);
        assert_eq!(
            decide(Some(&staff), "/admin/portfolio/other/5/change/"),
            Decision::Redirect("/admin/portfolio/user/7/change/".to_string())
        );
        assert_eq!(
            decide(Some(&staff), "/admin/portfolio/user/8/change/"),
            Decision::Redirect("/admin/portfolio/user/7/change/".to_string())
        );
    }

    #[test]
    fn substring_match_and_exact_allow_list() {
        let staff = account(7, true, false);
        // "admin" anywhere in the path counts.
        assert!(matches!(decide(Some(&staff), "/badminton"), Decision::Redirect(_)));
        // No trailing-slash normalization.
        assert!(matches!(
            decide(Some(&staff), "/admin/portfolio/user/viewmap/"),
            Decision::Redirect(_)
        ));
        assert!(matches!(
            decide(Some(&staff), "/admin/portfolio/user/7/change"),
            Decision::Redirect(_)
        ));
    }
}
