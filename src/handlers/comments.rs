use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::auth::{AuthUser, MaybeUser};
use crate::engagement;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateCommentRequest, NewComment, NotificationKind, UpdateCommentRequest, Video,
};
use crate::pagination::{PageMeta, PageQuery};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_comment)
        .service(list_comments)
        .service(list_replies)
        .service(update_comment)
        .service(delete_comment);
}

/// Commenting and reading comments both require a readable video: it must
/// exist, and be published unless the caller owns it.
async fn readable_video(key: &str, viewer: Option<&str>) -> ApiResult<Video> {
    let video = store::videos::get(key)
        .await?
        .ok_or_else(|| ApiError::NotFound("video not found".into()))?;
    if !video.is_published && viewer != Some(video.owner_id.as_str()) {
        return Err(ApiError::Forbidden("this video is not published".into()));
    }
    Ok(video)
}

#[post("/videos/{id}/comments")]
async fn create_comment(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let video_key = path.into_inner();
    let request = body.into_inner();
    request.validate()?;

    let video = readable_video(&video_key, Some(auth.0.key().as_str())).await?;

    // A reply's parent must exist and sit under the same video.
    if let Some(parent_id) = &request.parent_id {
        let parent = store::comments::get(parent_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("parent comment not found".into()))?;
        if parent.video_id != video_key {
            return Err(ApiError::invalid(
                "parent_id",
                "parent comment belongs to a different video",
            ));
        }
    }

    let now = Utc::now();
    let comment = store::comments::create(NewComment {
        content: request.content.trim().to_string(),
        video_id: video_key,
        owner_id: auth.0.key(),
        parent_id: request.parent_id,
        created_at: now,
        updated_at: now,
    })
    .await?;

    if video.owner_id != auth.0.key() {
        store::notifications::best_effort(store::notifications::engagement_notification(
            video.owner_id.clone(),
            NotificationKind::Comment,
            auth.0.key(),
            Some(video.key()),
        ))
        .await;
    }

    let views = engagement::enrich_comments(std::slice::from_ref(&comment), Some(&auth.0.key()))
        .await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("comment enrichment returned nothing".into()))?;
    Ok(ApiResponse::created("comment added", view))
}

#[get("/videos/{id}/comments")]
async fn list_comments(
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let video_key = path.into_inner();
    let viewer_id = viewer.viewer_id();
    readable_video(&video_key, viewer_id.as_deref()).await?;

    let params = query.resolve();
    let (comments, total) = store::comments::list_for_video(&video_key, params).await?;
    let views = engagement::enrich_comments(&comments, viewer_id.as_deref()).await?;
    Ok(ApiResponse::paginated(
        "comments",
        views,
        PageMeta::from_params(params, total),
    ))
}

#[get("/comments/{id}/replies")]
async fn list_replies(
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let parent_key = path.into_inner();
    let parent = store::comments::get(&parent_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;

    let viewer_id = viewer.viewer_id();
    readable_video(&parent.video_id, viewer_id.as_deref()).await?;

    let params = query.resolve();
    let (replies, total) = store::comments::list_replies(&parent_key, params).await?;
    let views = engagement::enrich_comments(&replies, viewer_id.as_deref()).await?;
    Ok(ApiResponse::paginated(
        "replies",
        views,
        PageMeta::from_params(params, total),
    ))
}

#[patch("/comments/{id}")]
async fn update_comment(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let request = body.into_inner();
    request.validate()?;

    let comment = store::comments::get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;
    if comment.owner_id != auth.0.key() {
        return Err(ApiError::Forbidden("you do not own this comment".into()));
    }

    let updated = store::comments::update_content(&key, request.content.trim().to_string())
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;

    let views =
        engagement::enrich_comments(std::slice::from_ref(&updated), Some(&auth.0.key())).await?;
    let view = views
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal("comment enrichment returned nothing".into()))?;
    Ok(ApiResponse::ok("comment updated", view))
}

/// The comment's author or the video's owner may delete a comment. Replies
/// and likes of the deleted comment are removed with it.
#[delete("/comments/{id}")]
async fn delete_comment(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let comment = store::comments::get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;

    let caller = auth.0.key();
    if comment.owner_id != caller {
        let video = store::videos::get(&comment.video_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("video not found".into()))?;
        if video.owner_id != caller {
            return Err(ApiError::Forbidden(
                "only the comment author or the video owner can delete this".into(),
            ));
        }
    }

    let mut doomed = store::comments::reply_keys(&key).await?;
    doomed.push(key.clone());

    store::likes::delete_for_targets("comment", doomed).await?;
    store::comments::delete_replies(&key).await?;
    store::comments::delete(&key).await?;

    Ok(ApiResponse::ok("comment deleted", serde_json::json!(null)))
}
