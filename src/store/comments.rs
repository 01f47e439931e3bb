use std::collections::HashMap;

use serde::Deserialize;

use crate::db::DB;
use crate::error::{ApiError, ApiResult};
use crate::models::{Comment, NewComment};
use crate::pagination::PageParams;

use super::{new_key, take_count, CountRow, COMMENT};

pub async fn create(new: NewComment) -> ApiResult<Comment> {
    let created: Option<Comment> = DB.create((COMMENT, new_key())).content(new).await?;
    created.ok_or_else(|| ApiError::Internal("comment insert returned nothing".into()))
}

pub async fn get(key: &str) -> ApiResult<Option<Comment>> {
    let comment: Option<Comment> = DB.select((COMMENT, key)).await?;
    Ok(comment)
}

pub async fn update_content(key: &str, content: String) -> ApiResult<Option<Comment>> {
    let mut resp = DB
        .query(
            "UPDATE type::thing('comment', $key) \
             SET content = $content, updated_at = $now",
        )
        .bind(("key", key.to_string()))
        .bind(("content", content))
        .bind(("now", chrono::Utc::now()))
        .await?;
    Ok(resp.take(0)?)
}

pub async fn delete(key: &str) -> ApiResult<()> {
    let _: Option<Comment> = DB.delete((COMMENT, key)).await?;
    Ok(())
}

/// Top-level comments of a video, newest first.
pub async fn list_for_video(video_id: &str, page: PageParams) -> ApiResult<(Vec<Comment>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM comment WHERE video_id = $video AND parent_id = NONE \
             ORDER BY created_at DESC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM comment WHERE video_id = $video AND parent_id = NONE GROUP ALL")
        .bind(("video", video_id.to_string()))
        .await?;
    let comments: Vec<Comment> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((comments, take_count(counts)))
}

/// Replies to a comment, oldest first so threads read top-down.
pub async fn list_replies(parent_id: &str, page: PageParams) -> ApiResult<(Vec<Comment>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM comment WHERE parent_id = $parent \
             ORDER BY created_at ASC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM comment WHERE parent_id = $parent GROUP ALL")
        .bind(("parent", parent_id.to_string()))
        .await?;
    let comments: Vec<Comment> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((comments, take_count(counts)))
}

#[derive(Debug, Deserialize)]
struct GroupedCount {
    #[serde(alias = "video_id", alias = "parent_id")]
    group: String,
    count: u64,
}

/// Total comment count (replies included) per video, for the composer.
pub async fn counts_for_videos(video_ids: Vec<String>) -> ApiResult<HashMap<String, u64>> {
    if video_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut resp = DB
        .query(
            "SELECT video_id, count() FROM comment \
             WHERE video_id INSIDE $videos GROUP BY video_id",
        )
        .bind(("videos", video_ids))
        .await?;
    let rows: Vec<GroupedCount> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| (r.group, r.count)).collect())
}

/// Reply count per parent comment.
pub async fn reply_counts(parent_ids: Vec<String>) -> ApiResult<HashMap<String, u64>> {
    if parent_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut resp = DB
        .query(
            "SELECT parent_id, count() FROM comment \
             WHERE parent_id INSIDE $parents GROUP BY parent_id",
        )
        .bind(("parents", parent_ids))
        .await?;
    let rows: Vec<GroupedCount> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| (r.group, r.count)).collect())
}

/// All comment keys of a video; used by the delete cascade to clear likes.
pub async fn keys_for_video(video_id: &str) -> ApiResult<Vec<String>> {
    #[derive(Deserialize)]
    struct KeyRow {
        key: String,
    }
    let mut resp = DB
        .query("SELECT record::id(id) AS key FROM comment WHERE video_id = $video")
        .bind(("video", video_id.to_string()))
        .await?;
    let rows: Vec<KeyRow> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| r.key).collect())
}

/// Keys of all direct replies to a comment. Reply trees are one level deep.
pub async fn reply_keys(parent_id: &str) -> ApiResult<Vec<String>> {
    #[derive(Deserialize)]
    struct KeyRow {
        key: String,
    }
    let mut resp = DB
        .query("SELECT record::id(id) AS key FROM comment WHERE parent_id = $parent")
        .bind(("parent", parent_id.to_string()))
        .await?;
    let rows: Vec<KeyRow> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| r.key).collect())
}

/// Remove all replies to a comment.
pub async fn delete_replies(parent_id: &str) -> ApiResult<u64> {
    let mut resp = DB
        .query("SELECT count() FROM comment WHERE parent_id = $parent GROUP ALL")
        .query("DELETE comment WHERE parent_id = $parent")
        .bind(("parent", parent_id.to_string()))
        .await?;
    let counts: Vec<CountRow> = resp.take(0)?;
    Ok(take_count(counts))
}

/// Cascade step of video deletion.
pub async fn delete_for_video(video_id: &str) -> ApiResult<u64> {
    let mut resp = DB
        .query("SELECT count() FROM comment WHERE video_id = $video GROUP ALL")
        .query("DELETE comment WHERE video_id = $video")
        .bind(("video", video_id.to_string()))
        .await?;
    let counts: Vec<CountRow> = resp.take(0)?;
    Ok(take_count(counts))
}
