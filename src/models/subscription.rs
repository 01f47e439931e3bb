use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Subscriber → channel edge. Unique per pair; self-subscription is rejected
/// before a row is ever written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: RecordId,
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSubscription {
    pub subscriber_id: String,
    pub channel_id: String,
    pub created_at: DateTime<Utc>,
}
