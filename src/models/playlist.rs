use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use super::user::OwnerSummary;
use super::video::VideoView;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    /// Ordered entries; a video appears at most once.
    pub entries: Vec<PlaylistEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    pub fn key(&self) -> String {
        self.id.key().to_string()
    }

    pub fn contains_video(&self, video_id: &str) -> bool {
        self.entries.iter().any(|e| e.video_id == video_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub video_id: String,
    pub order: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub entries: Vec<PlaylistEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner: OwnerSummary,
    pub videos: Vec<VideoView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description too long"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddPlaylistVideoRequest {
    #[validate(length(min = 1, message = "video id is required"))]
    pub video_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_video_checks_entries() {
        let playlist = Playlist {
            id: RecordId::from_table_key("playlist", "p1"),
            name: "watch later".into(),
            description: None,
            owner_id: "u1".into(),
            entries: vec![
                PlaylistEntry {
                    video_id: "v1".into(),
                    order: 0,
                },
                PlaylistEntry {
                    video_id: "v2".into(),
                    order: 1,
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(playlist.contains_video("v2"));
        assert!(!playlist.contains_video("v3"));
    }
}
