use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::user::OwnerSummary;

/// Stored comment. `parent_id` forms a reply tree; a parent always belongs to
/// the same video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: RecordId,
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn key(&self) -> String {
        self.id.key().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub content: String,
    pub video_id: String,
    pub owner_id: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub video_id: String,
    pub parent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: OwnerSummary,
    pub likes_count: u64,
    pub replies_count: u64,
    pub is_liked: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "content must be 1-1000 characters"))]
    pub content: String,
}
