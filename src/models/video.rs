use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::user::OwnerSummary;

/// Stored video record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub video_public_id: String,
    pub thumbnail_url: String,
    pub thumbnail_public_id: String,
    /// Seconds; always > 0.
    pub duration: f64,
    pub views: u64,
    pub is_published: bool,
    pub owner_id: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn key(&self) -> String {
        self.id.key().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub video_public_id: String,
    pub thumbnail_url: String,
    pub thumbnail_public_id: String,
    pub duration: f64,
    pub views: u64,
    pub is_published: bool,
    pub owner_id: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied with a merge; absent fields stay untouched.
#[derive(Debug, Default, Clone, Serialize)]
pub struct VideoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

/// Enriched projection served to clients: stored fields minus internal media
/// ids, plus the owner profile and engagement-derived fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: u64,
    pub is_published: bool,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerSummary,
    pub likes_count: u64,
    pub comments_count: u64,
    pub is_liked: bool,
    pub is_subscribed: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 120, message = "title must be 1-120 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "description too long"))]
    pub description: Option<String>,
    #[validate(length(max = 50, message = "category too long"))]
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateVideoRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}
