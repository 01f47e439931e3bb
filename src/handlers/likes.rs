use actix_web::{post, web, HttpResponse};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{LikeTarget, NotificationKind};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(toggle_video_like).service(toggle_comment_like);
}

#[derive(Debug, Serialize)]
struct ToggleOutcome {
    liked: bool,
}

#[post("/likes/video/{id}/toggle")]
async fn toggle_video_like(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let video_key = path.into_inner();
    let video = store::videos::get(&video_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("video not found".into()))?;
    if !video.is_published && video.owner_id != auth.0.key() {
        return Err(ApiError::Forbidden("this video is not published".into()));
    }

    let liked = store::likes::toggle(LikeTarget::Video(video_key), &auth.0.key()).await?;

    if liked && video.owner_id != auth.0.key() {
        store::notifications::best_effort(store::notifications::engagement_notification(
            video.owner_id.clone(),
            NotificationKind::Like,
            auth.0.key(),
            Some(video.key()),
        ))
        .await;
    }

    Ok(ApiResponse::ok("like toggled", ToggleOutcome { liked }))
}

#[post("/likes/comment/{id}/toggle")]
async fn toggle_comment_like(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let comment_key = path.into_inner();
    let comment = store::comments::get(&comment_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;

    let liked = store::likes::toggle(LikeTarget::Comment(comment_key), &auth.0.key()).await?;

    if liked && comment.owner_id != auth.0.key() {
        store::notifications::best_effort(store::notifications::engagement_notification(
            comment.owner_id.clone(),
            NotificationKind::Like,
            auth.0.key(),
            Some(comment.video_id.clone()),
        ))
        .await;
    }

    Ok(ApiResponse::ok("like toggled", ToggleOutcome { liked }))
}
