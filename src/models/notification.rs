use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Subscription,
}

/// Delivered to a single recipient; creation is always best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub actor_id: Option<String>,
    pub video_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn key(&self) -> String {
        self.id.key().to_string()
    }

    pub fn view(&self) -> NotificationView {
        NotificationView {
            id: self.key(),
            kind: self.kind,
            actor_id: self.actor_id.clone(),
            video_id: self.video_id.clone(),
            is_read: self.is_read,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub recipient_id: String,
    pub kind: NotificationKind,
    pub actor_id: Option<String>,
    pub video_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub actor_id: Option<String>,
    pub video_id: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
