use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Top-level error type returned by handlers and stores.
///
/// Every variant maps onto one entry of the client-facing taxonomy:
/// 400 validation, 401 authentication, 403 authorization, 404 missing,
/// 409 uniqueness conflict, 500 everything else.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldIssue>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("media storage error: {0}")]
    Media(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Shortcut for a single-field validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldIssue::new(field, message)])
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Validation(_) => "validation failed".to_string(),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            // Internal detail is logged, not surfaced, outside debug builds.
            ApiError::Database(_) | ApiError::Media(_) | ApiError::Internal(_) => {
                if cfg!(debug_assertions) {
                    self.to_string()
                } else {
                    "internal server error".to_string()
                }
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Media(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            ApiError::Database(e) => tracing::error!("database failure: {e}"),
            ApiError::Media(e) => tracing::error!("media storage failure: {e}"),
            ApiError::Internal(e) => tracing::error!("internal failure: {e}"),
            ApiError::Unauthorized(msg) => tracing::warn!("auth rejected: {msg}"),
            _ => tracing::debug!("request rejected: {self}"),
        }

        let details = match self {
            ApiError::Validation(issues) => json!(issues),
            other => json!([{ "message": other.client_message() }]),
        };

        HttpResponse::build(status).json(json!({
            "success": false,
            "statusCode": status.as_u16(),
            "message": self.client_message(),
            "data": null,
            "error": details,
        }))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let issues = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {field}"));
                    FieldIssue::new(field.to_string(), message)
                })
            })
            .collect();
        ApiError::Validation(issues)
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ApiError::Internal(format!("password hashing failed: {err}"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// SurrealDB reports unique-index violations as plain `Db` errors; the message
/// is the only stable discriminator.
pub fn is_unique_violation(err: &surrealdb::Error) -> bool {
    err.to_string().contains("already contains")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::invalid("email", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("token expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("not the owner".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("video".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("email taken".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn validator_errors_become_field_issues() {
        use validator::Validate;

        #[derive(Validate)]
        struct Form {
            #[validate(email(message = "invalid email format"))]
            email: String,
        }

        let bad = Form {
            email: "not-an-email".into(),
        };
        let err: ApiError = bad.validate().unwrap_err().into();
        match err {
            ApiError::Validation(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "email");
                assert_eq!(issues[0].message, "invalid email format");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
