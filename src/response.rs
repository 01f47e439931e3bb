use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

use crate::pagination::PageMeta;

/// The envelope every successful response is wrapped in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
    pub error: Option<()>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub pagination: PageMeta,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code: status.as_u16(),
            message: message.into(),
            data: Some(data),
            error: None,
            meta: None,
        }
    }

    /// 200 with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> HttpResponse {
        Self::new(StatusCode::OK, message, data).respond()
    }

    /// 201 with the created resource.
    pub fn created(message: impl Into<String>, data: T) -> HttpResponse {
        Self::new(StatusCode::CREATED, message, data).respond()
    }

    /// 200 with a payload and pagination metadata.
    pub fn paginated(message: impl Into<String>, data: T, pagination: PageMeta) -> HttpResponse {
        let mut body = Self::new(StatusCode::OK, message, data);
        body.meta = Some(Meta { pagination });
        body.respond()
    }

    fn respond(self) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn envelope_shape() {
        let body = ApiResponse::new(StatusCode::OK, "fetched", json!({"id": "v1"}));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["success"], Value::Bool(true));
        assert_eq!(value["statusCode"], json!(200));
        assert_eq!(value["message"], json!("fetched"));
        assert_eq!(value["data"]["id"], json!("v1"));
        assert_eq!(value["error"], Value::Null);
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn paginated_envelope_carries_meta() {
        let meta = Meta {
            pagination: PageMeta::new(2, 10, 35),
        };
        let mut body = ApiResponse::new(StatusCode::OK, "listed", json!([]));
        body.meta = Some(meta);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["meta"]["pagination"]["page"], json!(2));
        assert_eq!(value["meta"]["pagination"]["totalPages"], json!(4));
        assert_eq!(value["meta"]["pagination"]["hasPrevPage"], json!(true));
    }
}
