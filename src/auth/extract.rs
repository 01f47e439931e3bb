use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use crate::auth::tokens::{self, TokenKind};
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::store;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Extractor for endpoints that require an authenticated user.
///
/// Looks for a bearer `Authorization` header first, then the access-token
/// cookie. Missing or invalid credentials are a 401.
pub struct AuthUser(pub User);

/// Extractor for endpoints that work with or without a viewer. An absent or
/// invalid token degrades to anonymous instead of failing the request.
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn viewer_id(&self) -> Option<String> {
        self.0.as_ref().map(|u| u.key())
    }
}

fn bearer_or_cookie(req: &HttpRequest) -> Option<String> {
    let header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);
    header.or_else(|| req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string()))
}

async fn resolve_user(req: HttpRequest) -> ApiResult<User> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| ApiError::Internal("config not registered".into()))?;

    let token = bearer_or_cookie(&req)
        .ok_or_else(|| ApiError::Unauthorized("missing access token".into()))?;

    let claims = tokens::verify(&config.jwt, &token, TokenKind::Access)?;

    store::users::get(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { resolve_user(req).await.map(AuthUser) })
    }
}

impl FromRequest for MaybeUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { Ok(MaybeUser(resolve_user(req).await.ok())) })
    }
}
