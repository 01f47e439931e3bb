use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

use crate::error::ApiError;

/// What a report points at; same tagged-variant shape as a like target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_kind", content = "target_id", rename_all = "lowercase")]
pub enum ReportTarget {
    Video(String),
    Comment(String),
    User(String),
}

impl ReportTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportTarget::Video(_) => "video",
            ReportTarget::Comment(_) => "comment",
            ReportTarget::User(_) => "user",
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            ReportTarget::Video(id) | ReportTarget::Comment(id) | ReportTarget::User(id) => id,
        }
    }

    pub fn parse(kind: &str, id: String) -> Result<Self, ApiError> {
        match kind {
            "video" => Ok(ReportTarget::Video(id)),
            "comment" => Ok(ReportTarget::Comment(id)),
            "user" => Ok(ReportTarget::User(id)),
            other => Err(ApiError::invalid(
                "target_kind",
                format!("unknown report target kind '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Reviewed,
    Resolved,
}

/// One report per (reporter, target); enforced by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: RecordId,
    pub reporter_id: String,
    #[serde(flatten)]
    pub target: ReportTarget,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn key(&self) -> String {
        self.id.key().to_string()
    }

    pub fn view(&self) -> ReportView {
        ReportView {
            id: self.key(),
            target_kind: self.target.kind().to_string(),
            target_id: self.target.target_id().to_string(),
            reason: self.reason.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewReport {
    pub reporter_id: String,
    #[serde(flatten)]
    pub target: ReportTarget,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub target_kind: String,
    pub target_id: String,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 1, message = "target kind is required"))]
    pub target_kind: String,
    #[validate(length(min = 1, message = "target id is required"))]
    pub target_id: String,
    #[validate(length(min = 1, max = 500, message = "reason must be 1-500 characters"))]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_unknown_kind() {
        assert!(ReportTarget::parse("video", "v1".into()).is_ok());
        assert!(ReportTarget::parse("playlist", "p1".into()).is_err());
    }
}
