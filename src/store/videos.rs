use crate::db::DB;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewVideo, Video, VideoPatch};
use crate::pagination::PageParams;

use super::{new_key, take_count, CountRow, VIDEO};

/// Upper bound on candidates pulled for application-side relevance ranking.
pub const SEARCH_CANDIDATE_CAP: u64 = 500;

#[derive(Debug, Default, Clone)]
pub struct VideoFilter {
    pub owner_id: Option<String>,
    pub category: Option<String>,
    /// When true, unpublished videos are excluded.
    pub published_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl SortField {
    /// Whitelisted column name; anything unknown falls back to creation time.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("views") => SortField::Views,
            Some("duration") => SortField::Duration,
            Some("title") => SortField::Title,
            _ => SortField::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Views => "views",
            SortField::Duration => "duration",
            SortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

pub async fn create(new: NewVideo) -> ApiResult<Video> {
    let created: Option<Video> = DB.create((VIDEO, new_key())).content(new).await?;
    created.ok_or_else(|| ApiError::Internal("video insert returned nothing".into()))
}

pub async fn get(key: &str) -> ApiResult<Option<Video>> {
    let video: Option<Video> = DB.select((VIDEO, key)).await?;
    Ok(video)
}

pub async fn fetch_many(keys: Vec<String>) -> ApiResult<Vec<Video>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let mut resp = DB
        .query("SELECT * FROM video WHERE record::id(id) INSIDE $keys")
        .bind(("keys", keys))
        .await?;
    Ok(resp.take(0)?)
}

pub async fn merge(key: &str, patch: VideoPatch) -> ApiResult<Option<Video>> {
    let updated: Option<Video> = DB.update((VIDEO, key)).merge(patch).await?;
    Ok(updated)
}

pub async fn delete(key: &str) -> ApiResult<()> {
    let _: Option<Video> = DB.delete((VIDEO, key)).await?;
    Ok(())
}

pub async fn increment_views(key: &str) -> ApiResult<()> {
    DB.query("UPDATE type::thing('video', $key) SET views += 1")
        .bind(("key", key.to_string()))
        .await?;
    Ok(())
}

fn filter_clause(filter: &VideoFilter) -> String {
    let mut clauses = Vec::new();
    if filter.published_only {
        clauses.push("is_published = true".to_string());
    }
    if filter.owner_id.is_some() {
        clauses.push("owner_id = $owner".to_string());
    }
    if filter.category.is_some() {
        clauses.push("category = $category".to_string());
    }
    if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    }
}

/// Filtered, sorted window of videos plus the total match count.
pub async fn list(
    filter: VideoFilter,
    sort_field: SortField,
    sort_order: SortOrder,
    page: PageParams,
) -> ApiResult<(Vec<Video>, u64)> {
    let clause = filter_clause(&filter);
    let select = format!(
        "SELECT * FROM video {clause} ORDER BY {} {} LIMIT {} START {}",
        sort_field.column(),
        sort_order.keyword(),
        page.limit,
        page.skip(),
    );
    let count = format!("SELECT count() FROM video {clause} GROUP ALL");

    let mut query = DB.query(select).query(count);
    if let Some(owner) = filter.owner_id {
        query = query.bind(("owner", owner));
    }
    if let Some(category) = filter.category {
        query = query.bind(("category", category));
    }

    let mut resp = query.await?;
    let videos: Vec<Video> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((videos, take_count(counts)))
}

/// Published videos whose title, description or tags contain the query,
/// case-insensitively. Ranking happens application-side.
pub async fn search_candidates(query: &str) -> ApiResult<Vec<Video>> {
    let needle = query.to_lowercase();
    let mut resp = DB
        .query(format!(
            "SELECT * FROM video WHERE is_published = true AND ( \
                string::contains(string::lowercase(title), $needle) \
                OR string::contains(string::lowercase(description), $needle) \
                OR $needle INSIDE tags \
            ) LIMIT {SEARCH_CANDIDATE_CAP}"
        ))
        .bind(("needle", needle))
        .await?;
    Ok(resp.take(0)?)
}
