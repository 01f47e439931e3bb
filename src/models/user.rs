use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;
use validator::Validate;

/// Stored user record. Password hash, refresh tokens and watch history never
/// leave this module unshaped; clients only ever see [`UserView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub avatar_public_id: Option<String>,
    pub cover_url: Option<String>,
    pub cover_public_id: Option<String>,
    /// Active refresh tokens; rotation removes the presented one.
    pub refresh_tokens: Vec<String>,
    /// Watched video ids, most recent first.
    pub watch_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn key(&self) -> String {
        self.id.key().to_string()
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.key(),
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            cover_url: self.cover_url.clone(),
            created_at: self.created_at,
        }
    }

    pub fn owner_summary(&self) -> OwnerSummary {
        OwnerSummary {
            id: self.key(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            subscribers_count: None,
        }
    }
}

/// Insert payload; the record id is assigned by the store.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub avatar_public_id: Option<String>,
    pub cover_url: Option<String>,
    pub cover_public_id: Option<String>,
    pub refresh_tokens: Vec<String>,
    pub watch_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update applied with a merge; absent fields stay untouched.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_public_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Public shape of a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Owner projection embedded in enriched videos, comments and playlists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribers_count: Option<u64>,
}

/// Channel page projection: public profile plus subscription counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email.
    #[validate(length(min = 1, message = "username or email is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "full name must not be empty"))]
    pub full_name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_strips_sensitive_fields() {
        let user = User {
            id: RecordId::from_table_key("user", "u1"),
            username: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice".into(),
            password_hash: "$argon2id$...".into(),
            avatar_url: None,
            avatar_public_id: None,
            cover_url: None,
            cover_public_id: None,
            refresh_tokens: vec!["tok".into()],
            watch_history: vec!["v1".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(user.view()).unwrap();
        assert_eq!(value["id"], serde_json::json!("u1"));
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("refreshTokens").is_none());
        assert!(value.get("watchHistory").is_none());
    }

    #[test]
    fn register_request_validation() {
        let bad = RegisterRequest {
            username: "ab".into(),
            email: "nope".into(),
            full_name: "".into(),
            password: "short".into(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }
}
