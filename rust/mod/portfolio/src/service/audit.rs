use portfolio_core::{ListParams, ListResult, ServiceError};

use crate::model::{ActionKind, AuditDraft, AuditEntryView, AuditRecord, Identity, UserLink};
use crate::policy::guardrail;
use crate::service::{require_staff, PortfolioService};

impl PortfolioService {
    /// Append one audit entry. Entries are never updated or deleted.
    pub(crate) fn append_audit(&self, draft: AuditDraft) -> Result<AuditRecord, ServiceError> {
        self.audit.save_new(AuditRecord {
            id: self.audit.next_id()?,
            actor_id: draft.actor_id,
            target_entity_type: draft.target_entity_type.to_string(),
            target_id: draft.target_id,
            display_text: draft.display_text,
            action_kind: draft.action_kind,
            timestamp: String::new(),
        })
    }

    /// The audit list, newest first, optionally filtered by action flag.
    ///
    /// Superusers only. There is no delete operation.
    pub fn list_audit(
        &self,
        identity: &Identity,
        params: &ListParams,
        action_flag: Option<u8>,
    ) -> Result<ListResult<AuditEntryView>, ServiceError> {
        let viewer = require_staff(identity)?;
        if !viewer.is_superuser {
            return Err(ServiceError::PermissionDenied(
                "only superusers may view the audit log".into(),
            ));
        }
        let kind = action_flag
            .map(ActionKind::try_from)
            .transpose()
            .map_err(ServiceError::Validation)?;

        let mut records = self.audit.list()?;
        if let Some(kind) = kind {
            records.retain(|r| r.action_kind == kind);
        }
        records.sort_by(|a, b| b.id.cmp(&a.id));

        let views = records
            .into_iter()
            .map(|r| self.audit_view(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(params.page(views))
    }

    fn audit_view(&self, record: AuditRecord) -> Result<AuditEntryView, ServiceError> {
        let actor = self.accounts.get(&record.actor_id.to_string())?;
        let user_link = match actor {
            Some(actor) => UserLink {
                label: actor.username,
                href: Some(guardrail::change_page(record.actor_id)),
            },
            None => UserLink {
                label: record.actor_id.to_string(),
                href: None,
            },
        };
        Ok(AuditEntryView {
            id: record.id,
            user_link,
            content_type: record.target_entity_type,
            action_flag: record.action_kind,
            action_description: record.action_kind.label(),
            action_time: record.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::harness;

    fn draft(actor_id: u64, action_kind: ActionKind) -> AuditDraft {
        AuditDraft {
            actor_id,
            target_entity_type: "logentry",
            target_id: actor_id,
            display_text: format!("user{}", actor_id),
            action_kind,
        }
    }

    #[test]
    fn superuser_sees_newest_first_with_links() {
        let h = harness();
        let root = h.account("root", true, true, true);
        h.svc.append_audit(draft(root.id, ActionKind::Created)).unwrap();
        h.svc.append_audit(draft(404, ActionKind::Deleted)).unwrap();

        let page = h
            .svc
            .list_audit(&h.identity(&root), &ListParams::default(), None)
            .unwrap();
        assert_eq!(page.total, 2);

        let newest = &page.items[0];
        assert_eq!(newest.action_description, "Logged Out");
        assert_eq!(newest.user_link.label, "404");
        assert!(newest.user_link.href.is_none());

        let oldest = &page.items[1];
        assert_eq!(oldest.action_description, "Logged In");
        assert_eq!(oldest.user_link.label, "root");
        assert_eq!(
            oldest.user_link.href.as_deref(),
            Some(format!("/admin/portfolio/user/{}/change/", root.id).as_str())
        );
        assert_eq!(oldest.content_type, "logentry");
    }

    #[test]
    fn filter_by_action_flag() {
        let h = harness();
        let root = h.account("root", true, true, true);
        let me = h.identity(&root);
        h.svc.append_audit(draft(root.id, ActionKind::Created)).unwrap();
        h.svc.append_audit(draft(root.id, ActionKind::Deleted)).unwrap();
        h.svc.append_audit(draft(root.id, ActionKind::Created)).unwrap();

        let logins = h.svc.list_audit(&me, &ListParams::default(), Some(1)).unwrap();
        assert_eq!(logins.total, 2);
        let changes = h.svc.list_audit(&me, &ListParams::default(), Some(2)).unwrap();
        assert_eq!(changes.total, 0);
        assert!(matches!(
            h.svc.list_audit(&me, &ListParams::default(), Some(7)),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn staff_cannot_read_the_log() {
        let h = harness();
        let staff = h.account("staffer", true, true, false);
        assert!(matches!(
            h.svc
                .list_audit(&h.identity(&staff), &ListParams::default(), None),
            Err(ServiceError::PermissionDenied(_))
        ));
        assert!(matches!(
            h.svc
                .list_audit(&Identity::Anonymous, &ListParams::default(), None),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn ids_and_timestamps_are_assigned() {
        let h = harness();
        let a = h.svc.append_audit(draft(1, ActionKind::Created)).unwrap();
        let b = h.svc.append_audit(draft(1, ActionKind::Deleted)).unwrap();
        assert!(b.id > a.id);
        assert!(!a.timestamp.is_empty());
    }
}
