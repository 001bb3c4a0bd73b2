use serde::{Deserialize, Serialize};

/// Target type recorded on every login/logout entry: the audit entry
/// type itself.
pub const LOGENTRY_TYPE: &str = "logentry";

/// What an audit entry records. Serialized as the numeric flag the
/// audit list filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ActionKind {
    Created,
    Changed,
    Deleted,
}

impl ActionKind {
    pub fn flag(self) -> u8 {
        match self {
            ActionKind::Created => 1,
            ActionKind::Changed => 2,
            ActionKind::Deleted => 3,
        }
    }

    /// Label shown in the audit list.
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Created => "Logged In",
            ActionKind::Changed => "Change",
            ActionKind::Deleted => "Logged Out",
        }
    }
}

impl From<ActionKind> for u8 {
    fn from(kind: ActionKind) -> u8 {
        kind.flag()
    }
}

impl TryFrom<u8> for ActionKind {
    type Error = String;

    fn try_from(flag: u8) -> Result<Self, Self::Error> {
        match flag {
            1 => Ok(ActionKind::Created),
            2 => Ok(ActionKind::Changed),
            3 => Ok(ActionKind::Deleted),
            other => Err(format!("unknown action flag {}", other)),
        }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: u64,
    pub actor_id: u64,
    pub target_entity_type: String,
    pub target_id: u64,
    pub display_text: String,
    pub action_kind: ActionKind,
    /// RFC 3339, assigned when the entry is written.
    #[serde(default)]
    pub timestamp: String,
}

/// An audit entry before it is assigned an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub actor_id: u64,
    pub target_entity_type: &'static str,
    pub target_id: u64,
    pub display_text: String,
    pub action_kind: ActionKind,
}

/// Link to the actor's change page; `href` is None when the actor can no
/// longer be resolved and the label is shown as plain text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLink {
    pub label: String,
    pub href: Option<String>,
}

/// One row of the audit list.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryView {
    pub id: u64,
    pub user_link: UserLink,
    pub content_type: String,
    pub action_flag: ActionKind,
    pub action_description: &'static str,
    pub action_time: String,
}
