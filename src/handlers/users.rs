use actix_multipart::Multipart;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{get, patch, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::extract::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::auth::tokens::{self, TokenKind, TokenPair};
use crate::auth::{password, AuthUser, MaybeUser};
use crate::config::Config;
use crate::engagement;
use crate::error::{ApiError, ApiResult};
use crate::media::{MediaAsset, MediaStore};
use crate::models::{
    ChangePasswordRequest, LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, User,
    UserPatch, UserView,
};
use crate::pagination::{paginate_slice, PageQuery};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(refresh)
        .service(current_user)
        .service(change_password)
        .service(update_profile)
        .service(update_avatar)
        .service(update_cover)
        .service(channel_profile)
        .service(watch_history);
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthPayload {
    user: UserView,
    access_token: String,
    refresh_token: String,
}

fn auth_cookies(config: &Config, pair: &TokenPair) -> (Cookie<'static>, Cookie<'static>) {
    let access = Cookie::build(ACCESS_COOKIE, pair.access_token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.jwt.access_ttl_secs))
        .finish();
    let refresh_cookie = Cookie::build(REFRESH_COOKIE, pair.refresh_token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.jwt.refresh_ttl_secs))
        .finish();
    (access, refresh_cookie)
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::ZERO)
        .finish()
}

/// Roll back profile media committed for a registration that did not stick.
async fn discard_assets(media: &MediaStore, avatar: &MediaAsset, cover: Option<&MediaAsset>) {
    media.delete_best_effort(&avatar.public_id).await;
    if let Some(cover) = cover {
        media.delete_best_effort(&cover.public_id).await;
    }
}

/// The caller must prove knowledge of the current password before it can be
/// replaced. A wrong guess is a field-level validation failure; the caller's
/// identity was already established by the access token.
fn check_current_password(user: &User, presented: &str) -> ApiResult<()> {
    if password::verify(presented, &user.password_hash)? {
        Ok(())
    } else {
        Err(ApiError::invalid(
            "old_password",
            "current password is incorrect",
        ))
    }
}

async fn issue_session(config: &Config, user: &User) -> ApiResult<TokenPair> {
    let pair = tokens::issue_pair(&config.jwt, &user.key())?;
    store::users::add_refresh_token(&user.key(), pair.refresh_token.clone()).await?;
    Ok(pair)
}

#[post("/users/register")]
async fn register(
    config: web::Data<Config>,
    media: web::Data<MediaStore>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let mut form = media.read_form(payload).await?;

    let request = RegisterRequest {
        username: form.require_text("username")?.trim().to_lowercase(),
        email: form.require_text("email")?.trim().to_lowercase(),
        full_name: form.require_text("full_name")?.trim().to_string(),
        password: form.require_text("password")?,
    };
    request.validate()?;

    let avatar_file = form.require_file("avatar")?;
    let cover_file = form.take_file("cover");

    // Duplicates are rejected before any media is committed; the create call
    // below still backstops concurrent registrations.
    if store::users::find_by_email(&request.email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".into()));
    }
    if store::users::find_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("username already taken".into()));
    }

    let avatar = media.commit(avatar_file, "avatars").await?;
    let cover = match cover_file {
        Some(file) => match media.commit(file, "covers").await {
            Ok(asset) => Some(asset),
            Err(e) => {
                discard_assets(&media, &avatar, None).await;
                return Err(e);
            }
        },
        None => None,
    };

    let now = Utc::now();
    let created = store::users::create(NewUser {
        username: request.username,
        email: request.email,
        full_name: request.full_name,
        password_hash: password::hash(&request.password)?,
        avatar_url: Some(avatar.url.clone()),
        avatar_public_id: Some(avatar.public_id.clone()),
        cover_url: cover.as_ref().map(|c| c.url.clone()),
        cover_public_id: cover.as_ref().map(|c| c.public_id.clone()),
        refresh_tokens: Vec::new(),
        watch_history: Vec::new(),
        created_at: now,
        updated_at: now,
    })
    .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            // A lost race or DB failure must not strand the committed files.
            discard_assets(&media, &avatar, cover.as_ref()).await;
            return Err(e);
        }
    };

    let pair = issue_session(&config, &user).await?;
    let (access, refresh_cookie) = auth_cookies(&config, &pair);

    let mut response = ApiResponse::created(
        "user registered",
        AuthPayload {
            user: user.view(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
    );
    response.add_cookie(&access).ok();
    response.add_cookie(&refresh_cookie).ok();
    Ok(response)
}

#[post("/users/login")]
async fn login(
    config: web::Data<Config>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    let user = store::users::find_by_identifier(request.identifier.trim())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;

    if !password::verify(&request.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("invalid credentials".into()));
    }

    let pair = issue_session(&config, &user).await?;
    let (access, refresh_cookie) = auth_cookies(&config, &pair);

    let mut response = ApiResponse::ok(
        "logged in",
        AuthPayload {
            user: user.view(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
    );
    response.add_cookie(&access).ok();
    response.add_cookie(&refresh_cookie).ok();
    Ok(response)
}

#[post("/users/logout")]
async fn logout(auth: AuthUser, req: HttpRequest) -> ApiResult<HttpResponse> {
    if let Some(cookie) = req.cookie(REFRESH_COOKIE) {
        store::users::remove_refresh_token(&auth.0.key(), cookie.value().to_string()).await?;
    }

    let mut response = ApiResponse::ok("logged out", serde_json::json!(null));
    response.add_cookie(&expired_cookie(ACCESS_COOKIE)).ok();
    response.add_cookie(&expired_cookie(REFRESH_COOKIE)).ok();
    Ok(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

/// Rotate a refresh token: the presented token is invalidated and a fresh
/// access+refresh pair is issued.
#[post("/users/refresh")]
async fn refresh(
    config: web::Data<Config>,
    req: HttpRequest,
    body: Option<web::Json<RefreshBody>>,
) -> ApiResult<HttpResponse> {
    let presented = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.map(|b| b.into_inner().refresh_token))
        .ok_or_else(|| ApiError::Unauthorized("missing refresh token".into()))?;

    let claims = tokens::verify(&config.jwt, &presented, TokenKind::Refresh)?;

    let user = store::users::get(&claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".into()))?;

    if !user.refresh_tokens.iter().any(|t| t == &presented) {
        return Err(ApiError::Unauthorized("refresh token revoked".into()));
    }

    store::users::remove_refresh_token(&user.key(), presented).await?;
    let pair = issue_session(&config, &user).await?;
    let (access, refresh_cookie) = auth_cookies(&config, &pair);

    let mut response = ApiResponse::ok(
        "token refreshed",
        AuthPayload {
            user: user.view(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
    );
    response.add_cookie(&access).ok();
    response.add_cookie(&refresh_cookie).ok();
    Ok(response)
}

#[get("/users/me")]
async fn current_user(auth: AuthUser) -> ApiResult<HttpResponse> {
    Ok(ApiResponse::ok("current user", auth.0.view()))
}

#[post("/users/change-password")]
async fn change_password(
    auth: AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    check_current_password(&auth.0, &request.old_password)?;

    store::users::merge(
        &auth.0.key(),
        UserPatch {
            password_hash: Some(password::hash(&request.new_password)?),
            updated_at: Utc::now(),
            ..Default::default()
        },
    )
    .await?;

    Ok(ApiResponse::ok("password changed", serde_json::json!(null)))
}

#[patch("/users/me")]
async fn update_profile(
    auth: AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    if request.full_name.is_none() && request.email.is_none() {
        return Err(ApiError::BadRequest("nothing to update".into()));
    }

    if let Some(email) = &request.email {
        let email = email.to_lowercase();
        if let Some(existing) = store::users::find_by_email(&email).await? {
            if existing.key() != auth.0.key() {
                return Err(ApiError::Conflict("email already registered".into()));
            }
        }
    }

    let updated = store::users::merge(
        &auth.0.key(),
        UserPatch {
            full_name: request.full_name,
            email: request.email.map(|e| e.to_lowercase()),
            updated_at: Utc::now(),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    Ok(ApiResponse::ok("profile updated", updated.view()))
}

async fn replace_image(
    auth: &AuthUser,
    media: &MediaStore,
    payload: Multipart,
    field: &str,
    folder: &str,
) -> ApiResult<User> {
    let mut form = media.read_form(payload).await?;
    let file = form.require_file(field)?;
    let asset = media.commit(file, folder).await?;

    // Replacement drops the old file; losing that race is acceptable.
    let old_public_id = match field {
        "avatar" => auth.0.avatar_public_id.clone(),
        _ => auth.0.cover_public_id.clone(),
    };
    if let Some(old) = old_public_id {
        media.delete_best_effort(&old).await;
    }

    let patch = if field == "avatar" {
        UserPatch {
            avatar_url: Some(asset.url),
            avatar_public_id: Some(asset.public_id),
            updated_at: Utc::now(),
            ..Default::default()
        }
    } else {
        UserPatch {
            cover_url: Some(asset.url),
            cover_public_id: Some(asset.public_id),
            updated_at: Utc::now(),
            ..Default::default()
        }
    };

    store::users::merge(&auth.0.key(), patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

#[patch("/users/me/avatar")]
async fn update_avatar(
    auth: AuthUser,
    media: web::Data<MediaStore>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let updated = replace_image(&auth, &media, payload, "avatar", "avatars").await?;
    Ok(ApiResponse::ok("avatar updated", updated.view()))
}

#[patch("/users/me/cover")]
async fn update_cover(
    auth: AuthUser,
    media: web::Data<MediaStore>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let updated = replace_image(&auth, &media, payload, "cover", "covers").await?;
    Ok(ApiResponse::ok("cover updated", updated.view()))
}

#[get("/users/channel/{username}")]
async fn channel_profile(
    viewer: MaybeUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let username = path.into_inner();
    let channel = store::users::find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel not found".into()))?;

    let profile = engagement::channel_profile(&channel, viewer.viewer_id().as_deref()).await?;
    Ok(ApiResponse::ok("channel profile", profile))
}

/// Watched videos in most-recent-first order.
#[get("/users/history")]
async fn watch_history(auth: AuthUser, query: web::Query<PageQuery>) -> ApiResult<HttpResponse> {
    let params = query.resolve();
    let (page_ids, meta) = paginate_slice(&auth.0.watch_history, params);

    let fetched = store::videos::fetch_many(page_ids.clone()).await?;
    // Batched fetch loses the history order; restore it.
    let mut by_key: std::collections::HashMap<String, _> =
        fetched.into_iter().map(|v| (v.key(), v)).collect();
    let ordered: Vec<_> = page_ids.iter().filter_map(|id| by_key.remove(id)).collect();

    let views = engagement::enrich_videos(&ordered, Some(&auth.0.key())).await?;
    Ok(ApiResponse::paginated("watch history", views, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;
    use crate::error::ApiError;
    use crate::media::TempFile;
    use chrono::Utc;
    use std::path::Path;
    use surrealdb::RecordId;
    use uuid::Uuid;

    fn user_with_password(password: &str) -> User {
        User {
            id: RecordId::from_table_key("user", "u1"),
            username: "alice".into(),
            email: "alice@example.com".into(),
            full_name: "Alice".into(),
            password_hash: crate::auth::password::hash(password).unwrap(),
            avatar_url: None,
            avatar_public_id: None,
            cover_url: None,
            cover_public_id: None,
            refresh_tokens: Vec::new(),
            watch_history: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn wrong_current_password_is_a_validation_failure() {
        let user = user_with_password("correct horse battery");
        let err = check_current_password(&user, "wrong guess").unwrap_err();
        match err {
            ApiError::Validation(issues) => {
                assert_eq!(issues[0].field, "old_password");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(check_current_password(&user, "correct horse battery").is_ok());
    }

    fn store(dir: &tempfile::TempDir) -> MediaStore {
        MediaStore::new(&MediaConfig {
            root: dir.path().to_string_lossy().into_owned(),
            base_url: "http://localhost:8080/media".into(),
        })
        .unwrap()
    }

    fn temp_file(store_root: &Path, name: &str) -> TempFile {
        let path = store_root.join("tmp").join(Uuid::new_v4().simple().to_string());
        std::fs::write(&path, b"bytes").unwrap();
        TempFile {
            path,
            original_name: name.to_string(),
            size: 5,
        }
    }

    #[tokio::test]
    async fn discard_assets_removes_committed_profile_media() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(&dir);

        let avatar = media
            .commit(temp_file(dir.path(), "a.png"), "avatars")
            .await
            .unwrap();
        let cover = media
            .commit(temp_file(dir.path(), "c.jpg"), "covers")
            .await
            .unwrap();
        assert!(dir.path().join(&avatar.public_id).exists());
        assert!(dir.path().join(&cover.public_id).exists());

        discard_assets(&media, &avatar, Some(&cover)).await;
        assert!(!dir.path().join(&avatar.public_id).exists());
        assert!(!dir.path().join(&cover.public_id).exists());
    }
}
