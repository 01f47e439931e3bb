use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// What a like points at. A tagged variant rather than two nullable foreign
/// keys, so exactly-one-of is enforced by the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_kind", content = "target_id", rename_all = "lowercase")]
pub enum LikeTarget {
    Video(String),
    Comment(String),
}

impl LikeTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Video(_) => "video",
            LikeTarget::Comment(_) => "comment",
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            LikeTarget::Video(id) | LikeTarget::Comment(id) => id,
        }
    }
}

/// One like per (target, user); enforced by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: RecordId,
    #[serde(flatten)]
    pub target: LikeTarget,
    pub liked_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLike {
    #[serde(flatten)]
    pub target: LikeTarget,
    pub liked_by: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_serializes_as_kind_plus_id() {
        let like = NewLike {
            target: LikeTarget::Video("v1".into()),
            liked_by: "u1".into(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&like).unwrap();
        assert_eq!(value["target_kind"], serde_json::json!("video"));
        assert_eq!(value["target_id"], serde_json::json!("v1"));
        assert_eq!(value["liked_by"], serde_json::json!("u1"));
    }

    #[test]
    fn target_accessors() {
        let t = LikeTarget::Comment("c9".into());
        assert_eq!(t.kind(), "comment");
        assert_eq!(t.target_id(), "c9");
    }
}
