use actix_web::{delete, get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::auth::{AuthUser, MaybeUser};
use crate::engagement;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    AddPlaylistVideoRequest, CreatePlaylistRequest, NewPlaylist, Playlist, PlaylistEntry,
    PlaylistView,
};
use crate::pagination::{PageMeta, PageQuery};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_playlist)
        .service(list_user_playlists)
        .service(get_playlist)
        .service(add_video)
        .service(remove_video)
        .service(delete_playlist);
}

async fn owned_playlist(key: &str, user_key: &str) -> ApiResult<Playlist> {
    let playlist = store::playlists::get(key)
        .await?
        .ok_or_else(|| ApiError::NotFound("playlist not found".into()))?;
    if playlist.owner_id != user_key {
        return Err(ApiError::Forbidden("you do not own this playlist".into()));
    }
    Ok(playlist)
}

/// Resolve entries to enriched videos, in playlist order. Unpublished videos
/// stay visible to the playlist owner only; deleted ones are skipped.
async fn enrich_playlist(playlist: &Playlist, viewer: Option<&str>) -> ApiResult<PlaylistView> {
    let owner = store::users::get(&playlist.owner_id).await?;
    let owner_summary = match owner {
        Some(user) => {
            let mut summary = user.owner_summary();
            summary.subscribers_count =
                Some(store::subscriptions::subscriber_count(&user.key()).await?);
            summary
        }
        None => crate::models::OwnerSummary {
            id: playlist.owner_id.clone(),
            username: "deleted".into(),
            full_name: "Deleted User".into(),
            avatar_url: None,
            subscribers_count: None,
        },
    };

    let mut ordered = playlist.entries.clone();
    ordered.sort_by_key(|e| e.order);
    let ids: Vec<String> = ordered.iter().map(|e| e.video_id.clone()).collect();

    let fetched = store::videos::fetch_many(ids.clone()).await?;
    let is_owner = viewer == Some(playlist.owner_id.as_str());
    let mut by_key: std::collections::HashMap<String, _> = fetched
        .into_iter()
        .filter(|v| v.is_published || is_owner)
        .map(|v| (v.key(), v))
        .collect();
    let videos: Vec<_> = ids.iter().filter_map(|id| by_key.remove(id)).collect();

    let video_views = engagement::enrich_videos(&videos, viewer).await?;

    Ok(PlaylistView {
        id: playlist.key(),
        name: playlist.name.clone(),
        description: playlist.description.clone(),
        owner: owner_summary,
        videos: video_views,
        created_at: playlist.created_at,
        updated_at: playlist.updated_at,
    })
}

#[post("/playlists")]
async fn create_playlist(
    auth: AuthUser,
    body: web::Json<CreatePlaylistRequest>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    request.validate()?;

    let now = Utc::now();
    let playlist = store::playlists::create(NewPlaylist {
        name: request.name.trim().to_string(),
        description: request.description,
        owner_id: auth.0.key(),
        entries: Vec::new(),
        created_at: now,
        updated_at: now,
    })
    .await?;

    let view = enrich_playlist(&playlist, Some(&auth.0.key())).await?;
    Ok(ApiResponse::created("playlist created", view))
}

#[get("/playlists/user/{username}")]
async fn list_user_playlists(
    viewer: MaybeUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let username = path.into_inner();
    let owner = store::users::find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let params = query.resolve();
    let (playlists, total) = store::playlists::list_by_owner(&owner.key(), params).await?;

    let viewer_id = viewer.viewer_id();
    let mut views = Vec::with_capacity(playlists.len());
    for playlist in &playlists {
        views.push(enrich_playlist(playlist, viewer_id.as_deref()).await?);
    }

    Ok(ApiResponse::paginated(
        "playlists",
        views,
        PageMeta::from_params(params, total),
    ))
}

#[get("/playlists/{id}")]
async fn get_playlist(viewer: MaybeUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let playlist = store::playlists::get(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound("playlist not found".into()))?;

    let view = enrich_playlist(&playlist, viewer.viewer_id().as_deref()).await?;
    Ok(ApiResponse::ok("playlist", view))
}

#[post("/playlists/{id}/videos")]
async fn add_video(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<AddPlaylistVideoRequest>,
) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    let request = body.into_inner();
    request.validate()?;

    let playlist = owned_playlist(&key, &auth.0.key()).await?;

    let video = store::videos::get(&request.video_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("video not found".into()))?;
    if !video.is_published && video.owner_id != auth.0.key() {
        return Err(ApiError::Forbidden("this video is not published".into()));
    }

    if playlist.contains_video(&request.video_id) {
        return Err(ApiError::Conflict("video is already in this playlist".into()));
    }

    let mut entries = playlist.entries.clone();
    entries.push(PlaylistEntry {
        video_id: request.video_id,
        order: entries.len() as u32,
    });

    let updated = store::playlists::set_entries(&key, entries)
        .await?
        .ok_or_else(|| ApiError::NotFound("playlist not found".into()))?;

    let view = enrich_playlist(&updated, Some(&auth.0.key())).await?;
    Ok(ApiResponse::ok("video added to playlist", view))
}

#[delete("/playlists/{id}/videos/{videoId}")]
async fn remove_video(
    auth: AuthUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (key, video_id) = path.into_inner();
    let playlist = owned_playlist(&key, &auth.0.key()).await?;

    if !playlist.contains_video(&video_id) {
        return Err(ApiError::NotFound("video is not in this playlist".into()));
    }

    // Remaining entries are renumbered to stay dense.
    let entries: Vec<PlaylistEntry> = playlist
        .entries
        .iter()
        .filter(|e| e.video_id != video_id)
        .enumerate()
        .map(|(order, e)| PlaylistEntry {
            video_id: e.video_id.clone(),
            order: order as u32,
        })
        .collect();

    let updated = store::playlists::set_entries(&key, entries)
        .await?
        .ok_or_else(|| ApiError::NotFound("playlist not found".into()))?;

    let view = enrich_playlist(&updated, Some(&auth.0.key())).await?;
    Ok(ApiResponse::ok("video removed from playlist", view))
}

#[delete("/playlists/{id}")]
async fn delete_playlist(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let key = path.into_inner();
    owned_playlist(&key, &auth.0.key()).await?;
    store::playlists::delete(&key).await?;
    Ok(ApiResponse::ok("playlist deleted", serde_json::json!(null)))
}
