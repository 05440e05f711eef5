use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A state change worth recording, produced by request handlers and consumed
/// by the background activity sink. Delivery is best-effort: producing an
/// activity never fails the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    Audit(AuditRecord),
    Notification(NotificationRecord),
}

impl Activity {
    /// Topic used for log correlation (e.g., "registration.create").
    pub fn topic(&self) -> &str {
        match self {
            Self::Audit(a) => &a.action,
            Self::Notification(n) => &n.topic,
        }
    }
}

/// Append-only record of who did what to which entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// `None` for system-initiated changes.
    pub actor_id: Option<i32>,
    /// Dotted action name, `<entity>.<verb>`.
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i32>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(actor_id: Option<i32>, action: &str, entity: &str, entity_id: Option<i32>) -> Self {
        Self {
            actor_id,
            action: action.to_string(),
            entity: entity.to_string(),
            entity_id,
            before: None,
            after: None,
            at: Utc::now(),
        }
    }

    /// Attach the entity state before the change.
    pub fn before<T: Serialize>(mut self, value: &T) -> Self {
        self.before = serde_json::to_value(value).ok();
        self
    }

    /// Attach the entity state after the change.
    pub fn after<T: Serialize>(mut self, value: &T) -> Self {
        self.after = serde_json::to_value(value).ok();
        self
    }
}

/// A message addressed to a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub user_id: i32,
    pub topic: String,
    pub message: String,
    pub entity: Option<String>,
    pub entity_id: Option<i32>,
    pub at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(user_id: i32, topic: &str, message: impl Into<String>) -> Self {
        Self {
            user_id,
            topic: topic.to_string(),
            message: message.into(),
            entity: None,
            entity_id: None,
            at: Utc::now(),
        }
    }

    pub fn about(mut self, entity: &str, entity_id: i32) -> Self {
        self.entity = Some(entity.to_string());
        self.entity_id = Some(entity_id);
        self
    }
}

impl From<AuditRecord> for Activity {
    fn from(record: AuditRecord) -> Self {
        Self::Audit(record)
    }
}

impl From<NotificationRecord> for Activity {
    fn from(record: NotificationRecord) -> Self {
        Self::Notification(record)
    }
}
