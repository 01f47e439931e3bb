use chrono::Utc;

use crate::db::DB;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewPlaylist, Playlist, PlaylistEntry};
use crate::pagination::PageParams;

use super::{new_key, take_count, CountRow, PLAYLIST};

pub async fn create(new: NewPlaylist) -> ApiResult<Playlist> {
    let created: Option<Playlist> = DB.create((PLAYLIST, new_key())).content(new).await?;
    created.ok_or_else(|| ApiError::Internal("playlist insert returned nothing".into()))
}

pub async fn get(key: &str) -> ApiResult<Option<Playlist>> {
    let playlist: Option<Playlist> = DB.select((PLAYLIST, key)).await?;
    Ok(playlist)
}

pub async fn delete(key: &str) -> ApiResult<()> {
    let _: Option<Playlist> = DB.delete((PLAYLIST, key)).await?;
    Ok(())
}

pub async fn list_by_owner(owner_id: &str, page: PageParams) -> ApiResult<(Vec<Playlist>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM playlist WHERE owner_id = $owner \
             ORDER BY created_at DESC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM playlist WHERE owner_id = $owner GROUP ALL")
        .bind(("owner", owner_id.to_string()))
        .await?;
    let playlists: Vec<Playlist> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((playlists, take_count(counts)))
}

pub async fn set_entries(key: &str, entries: Vec<PlaylistEntry>) -> ApiResult<Option<Playlist>> {
    let mut resp = DB
        .query("UPDATE type::thing('playlist', $key) SET entries = $entries, updated_at = $now")
        .bind(("key", key.to_string()))
        .bind(("entries", entries))
        .bind(("now", Utc::now()))
        .await?;
    Ok(resp.take(0)?)
}

/// Cascade step of video deletion: drop the video from every playlist that
/// references it. Entries are renumbered to stay dense.
pub async fn scrub_video(video_id: &str) -> ApiResult<u64> {
    let mut resp = DB
        .query("SELECT * FROM playlist WHERE $video INSIDE entries.video_id")
        .bind(("video", video_id.to_string()))
        .await?;
    let affected: Vec<Playlist> = resp.take(0)?;
    let touched = affected.len() as u64;

    for playlist in affected {
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
        set_entries(&playlist.key(), entries).await?;
    }

    Ok(touched)
}
