use actix_multipart::Multipart;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{AuthUser, MaybeUser};
use crate::engagement;
use crate::error::{ApiError, ApiResult};
use crate::media::MediaStore;
use crate::models::{NewVideo, UpdateVideoRequest, Video, VideoPatch};
use crate::pagination::{paginate_slice, PageMeta, PageQuery};
use crate::response::ApiResponse;
use crate::search;
use crate::store;
use crate::store::videos::{SortField, SortOrder, VideoFilter};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_video)
        .service(list_videos)
        .service(search_videos)
        .service(get_video)
        .service(update_video)
        .service(delete_video)
        .service(toggle_publish)
        .service(record_view);
}

/// Fetch a video and require that `user` owns it. Runs before any mutation so
/// a foreign caller learns the video exists but cannot change it.
async fn owned_video(key: &str, user_key: &str) -> ApiResult<Video> {
    let video = store::videos::get(key)
        .await?
        .ok_or_else(|| ApiError::NotFound("video not found".into()))?;
    if video.owner_id != user_key {
        return Err(ApiError::Forbidden("you do not own this video".into()));
    }
    Ok(video)
}

fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    })
    .unwrap_or_default()
}

#[post("/videos")]
async fn upload_video(
    auth: AuthUser,
    media: web::Data<MediaStore>,
    payload: Multipart,
) -> ApiResult<HttpResponse> {
    let mut form = media.read_form(payload).await?;

    let title = form.require_text("title")?.trim().to_string();
    if title.is_empty() || title.len() > 120 {
        return Err(ApiError::invalid("title", "title must be 1-120 characters"));
    }
    let description = form.text("description").unwrap_or_default().to_string();
    let category = form
        .text("category")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let tags = parse_tags(form.text("tags"));

    // Duration comes from the client; there is no server-side transcoding.
    let duration: f64 = form
        .require_text("duration")?
        .trim()
        .parse()
        .map_err(|_| ApiError::invalid("duration", "duration must be a number of seconds"))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(ApiError::invalid("duration", "duration must be positive"));
    }

    let video_file = form.require_file("video")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let video_asset = media.commit(video_file, "videos").await?;
    let thumbnail_asset = match media.commit(thumbnail_file, "thumbnails").await {
        Ok(asset) => asset,
        Err(e) => {
            media.delete_best_effort(&video_asset.public_id).await;
            return Err(e);
        }
    };

    let now = Utc::now();
    let video = store::videos::create(NewVideo {
        title,
        description,
        video_url: video_asset.url,
        video_public_id: video_asset.public_id,
        thumbnail_url: thumbnail_asset.url,
        thumbnail_public_id: thumbnail_asset.public_id,
        duration,
        views: 0,
        is_published: true,
        owner_id: auth.0.key(),
        category,
        tags,
        created_at: now,
        updated_at: now,
    })
    .await?;

    let view = engagement::enrich_video(&video, Some(&auth.0.key())).await?;
    Ok(ApiResponse::created("video uploaded", view))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    #[serde(alias = "sortBy")]
    sort_by: Option<String>,
    #[serde(alias = "sortType")]
    sort_type: Option<String>,
    username: Option<String>,
    category: Option<String>,
}

#[get("/videos")]
async fn list_videos(viewer: MaybeUser, query: web::Query<ListQuery>) -> ApiResult<HttpResponse> {
    let q = query.into_inner();
    let params = PageQuery {
        page: q.page,
        limit: q.limit,
    }
    .resolve();

    let mut filter = VideoFilter {
        category: q.category,
        published_only: true,
        ..Default::default()
    };

    // Filtering by channel: unknown usernames are an empty page, not an
    // error. A channel owner browsing their own uploads sees drafts too.
    if let Some(username) = q.username {
        match store::users::find_by_username(&username).await? {
            Some(owner) => {
                let owner_key = owner.key();
                filter.published_only = viewer.viewer_id().as_deref() != Some(owner_key.as_str());
                filter.owner_id = Some(owner_key);
            }
            None => {
                return Ok(ApiResponse::paginated(
                    "videos",
                    Vec::<serde_json::Value>::new(),
                    PageMeta::from_params(params, 0),
                ));
            }
        }
    }

    let sort_field = SortField::parse(q.sort_by.as_deref());
    let sort_order = SortOrder::parse(q.sort_type.as_deref());

    let (videos, total) = store::videos::list(filter, sort_field, sort_order, params).await?;
    let views = engagement::enrich_videos(&videos, viewer.viewer_id().as_deref()).await?;
    Ok(ApiResponse::paginated(
        "videos",
        views,
        PageMeta::from_params(params, total),
    ))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[get("/videos/search")]
async fn search_videos(
    viewer: MaybeUser,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let q = query.into_inner();
    let needle = q
        .query
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::invalid("query", "search query is required"))?
        .to_string();
    let params = PageQuery {
        page: q.page,
        limit: q.limit,
    }
    .resolve();

    let candidates = store::videos::search_candidates(&needle).await?;
    let candidate_ids: Vec<String> = candidates.iter().map(|v| v.key()).collect();
    let like_counts = store::likes::counts_for("video", candidate_ids).await?;

    let ranked = search::rank(candidates, &like_counts, &needle, Utc::now());
    let (page, meta) = paginate_slice(&ranked, params);

    let views = engagement::enrich_videos(&page, viewer.viewer_id().as_deref()).await?;
    Ok(ApiResponse::paginated("search results", views, meta))
}

#[get("/videos/{id}")]
async fn get_video(viewer: MaybeUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let video = store::videos::get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("video not found".into()))?;

    let viewer_id = viewer.viewer_id();
    if !video.is_published && viewer_id.as_deref() != Some(video.owner_id.as_str()) {
        return Err(ApiError::Forbidden("this video is not published".into()));
    }

    let view = engagement::enrich_video(&video, viewer_id.as_deref()).await?;
    Ok(ApiResponse::ok("video", view))
}

#[patch("/videos/{id}")]
async fn update_video(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<UpdateVideoRequest>,
) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let request = body.into_inner();
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::BadRequest("nothing to update".into()));
    }

    owned_video(&key, &auth.0.key()).await?;

    let updated = store::videos::merge(
        &key,
        VideoPatch {
            title: request.title,
            description: request.description,
            category: request.category,
            tags: request
                .tags
                .map(|t| t.into_iter().map(|tag| tag.to_lowercase()).collect()),
            updated_at: Utc::now(),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("video not found".into()))?;

    let view = engagement::enrich_video(&updated, Some(&auth.0.key())).await?;
    Ok(ApiResponse::ok("video updated", view))
}

/// Outcome of one step of the delete cascade.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StepOutcome {
    ok: bool,
    removed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl StepOutcome {
    fn done(removed: u64) -> Self {
        Self {
            ok: true,
            removed,
            detail: None,
        }
    }

    fn failed(e: impl std::fmt::Display) -> Self {
        Self {
            ok: false,
            removed: 0,
            detail: Some(e.to_string()),
        }
    }

    fn from_count(result: ApiResult<u64>) -> Self {
        match result {
            Ok(removed) => Self::done(removed),
            Err(e) => Self::failed(e),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CascadeReport {
    video_id: String,
    media: StepOutcome,
    watch_history: StepOutcome,
    playlists: StepOutcome,
    likes: StepOutcome,
    comments: StepOutcome,
    record: StepOutcome,
}

/// Delete a video and everything hanging off it. Each step is best-effort:
/// one failing step is reported in the response instead of aborting the rest,
/// so a partial failure never strands more data than it has to.
#[delete("/videos/{id}")]
async fn delete_video(
    auth: AuthUser,
    media: web::Data<MediaStore>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let video = owned_video(&key, &auth.0.key()).await?;

    let mut media_removed = 0u64;
    if media.delete_best_effort(&video.video_public_id).await {
        media_removed += 1;
    }
    if media.delete_best_effort(&video.thumbnail_public_id).await {
        media_removed += 1;
    }
    let media_step = StepOutcome::done(media_removed);

    let watch_history = StepOutcome::from_count(store::users::scrub_watch_history(&key).await);
    let playlists = StepOutcome::from_count(store::playlists::scrub_video(&key).await);

    let likes = match store::comments::keys_for_video(&key).await {
        Ok(comment_keys) => {
            let video_likes = store::likes::delete_for_targets("video", vec![key.clone()]).await;
            let comment_likes = store::likes::delete_for_targets("comment", comment_keys).await;
            match video_likes.and(comment_likes) {
                Ok(()) => StepOutcome::done(0),
                Err(e) => StepOutcome::failed(e),
            }
        }
        Err(e) => StepOutcome::failed(e),
    };

    let comments = StepOutcome::from_count(store::comments::delete_for_video(&key).await);

    let record = match store::videos::delete(&key).await {
        Ok(()) => StepOutcome::done(1),
        Err(e) => StepOutcome::failed(e),
    };

    let report = CascadeReport {
        video_id: key,
        media: media_step,
        watch_history,
        playlists,
        likes,
        comments,
        record,
    };
    Ok(ApiResponse::ok("video deleted", report))
}

#[patch("/videos/{id}/publish")]
async fn toggle_publish(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let video = owned_video(&key, &auth.0.key()).await?;

    let updated = store::videos::merge(
        &key,
        VideoPatch {
            is_published: Some(!video.is_published),
            updated_at: Utc::now(),
            ..Default::default()
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("video not found".into()))?;

    let view = engagement::enrich_video(&updated, Some(&auth.0.key())).await?;
    Ok(ApiResponse::ok("publish state toggled", view))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchOutcome {
    view_counted: bool,
}

/// Register a watch. The view counter only moves on the viewer's first watch
/// of the video, and never for the owner watching their own upload.
#[post("/videos/{id}/watch")]
async fn record_view(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let video = store::videos::get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("video not found".into()))?;
    if !video.is_published && video.owner_id != auth.0.key() {
        return Err(ApiError::Forbidden("this video is not published".into()));
    }

    let first_watch = store::users::record_watch(&auth.0, &key).await?;
    let view_counted = first_watch && video.owner_id != auth.0.key();
    if view_counted {
        store::videos::increment_views(&key).await?;
    }

    Ok(ApiResponse::ok("watch recorded", WatchOutcome { view_counted }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_split_trimmed_and_lowercased() {
        assert_eq!(
            parse_tags(Some("Rust, Web ,  , actix")),
            vec!["rust", "web", "actix"]
        );
        assert!(parse_tags(None).is_empty());
        assert!(parse_tags(Some("  ,, ")).is_empty());
    }

    #[test]
    fn cascade_report_names_failed_steps() {
        let report = CascadeReport {
            video_id: "v1".into(),
            media: StepOutcome::done(2),
            watch_history: StepOutcome::done(3),
            playlists: StepOutcome::failed("connection reset"),
            likes: StepOutcome::done(0),
            comments: StepOutcome::done(7),
            record: StepOutcome::done(1),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["videoId"], serde_json::json!("v1"));
        assert_eq!(value["playlists"]["ok"], serde_json::json!(false));
        assert_eq!(
            value["playlists"]["detail"],
            serde_json::json!("connection reset")
        );
        assert!(value["media"].get("detail").is_none());
        assert_eq!(value["comments"]["removed"], serde_json::json!(7));
    }
}
