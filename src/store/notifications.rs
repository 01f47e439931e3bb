use chrono::Utc;

use crate::db::DB;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewNotification, Notification};
use crate::pagination::PageParams;

use super::{new_key, take_count, CountRow, NOTIFICATION};

pub async fn create(new: NewNotification) -> ApiResult<Notification> {
    let created: Option<Notification> = DB.create((NOTIFICATION, new_key())).content(new).await?;
    created.ok_or_else(|| ApiError::Internal("notification insert returned nothing".into()))
}

pub async fn get(key: &str) -> ApiResult<Option<Notification>> {
    let notification: Option<Notification> = DB.select((NOTIFICATION, key)).await?;
    Ok(notification)
}

/// A user's notifications, newest first.
pub async fn list_for_recipient(
    recipient_id: &str,
    page: PageParams,
) -> ApiResult<(Vec<Notification>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM notification WHERE recipient_id = $recipient \
             ORDER BY created_at DESC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM notification WHERE recipient_id = $recipient GROUP ALL")
        .bind(("recipient", recipient_id.to_string()))
        .await?;
    let notifications: Vec<Notification> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((notifications, take_count(counts)))
}

pub async fn mark_read(key: &str) -> ApiResult<Option<Notification>> {
    let mut resp = DB
        .query("UPDATE type::thing('notification', $key) SET is_read = true")
        .bind(("key", key.to_string()))
        .await?;
    Ok(resp.take(0)?)
}

pub async fn mark_all_read(recipient_id: &str) -> ApiResult<()> {
    DB.query("UPDATE notification SET is_read = true WHERE recipient_id = $recipient AND is_read = false")
        .bind(("recipient", recipient_id.to_string()))
        .await?;
    Ok(())
}

/// Fire-and-forget creation. Notification delivery is never part of the
/// primary operation's contract; failures are logged and swallowed.
pub async fn best_effort(new: NewNotification) {
    if let Err(e) = create(new).await {
        tracing::warn!("notification creation failed: {e}");
    }
}

/// Convenience constructor used by the engagement paths.
pub fn engagement_notification(
    recipient_id: String,
    kind: crate::models::NotificationKind,
    actor_id: String,
    video_id: Option<String>,
) -> NewNotification {
    NewNotification {
        recipient_id,
        kind,
        actor_id: Some(actor_id),
        video_id,
        is_read: false,
        created_at: Utc::now(),
    }
}
