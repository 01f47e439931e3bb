use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Deserialize;

use crate::db::DB;
use crate::error::ApiResult;
use crate::models::{Like, LikeTarget, NewLike};

use super::{new_key, toggle_insert_state, LIKE};

pub async fn find(target: &LikeTarget, user_id: &str) -> ApiResult<Option<Like>> {
    let mut resp = DB
        .query(
            "SELECT * FROM like WHERE target_kind = $kind AND target_id = $target \
             AND liked_by = $user LIMIT 1",
        )
        .bind(("kind", target.kind().to_string()))
        .bind(("target", target.target_id().to_string()))
        .bind(("user", user_id.to_string()))
        .await?;
    Ok(resp.take(0)?)
}

/// Flip the like relation for (user, target). Returns the new state: true
/// when the like is now on.
///
/// A concurrent double-toggle can race past the existence check; the unique
/// index then rejects the second insert, and that conflict is reported as
/// "now on" since the end state is identical.
pub async fn toggle(target: LikeTarget, user_id: &str) -> ApiResult<bool> {
    if let Some(existing) = find(&target, user_id).await? {
        let _: Option<Like> = DB.delete((LIKE, existing.id.key().to_string())).await?;
        return Ok(false);
    }

    let new = NewLike {
        target,
        liked_by: user_id.to_string(),
        created_at: Utc::now(),
    };
    let inserted: Result<Option<Like>, surrealdb::Error> =
        DB.create((LIKE, new_key())).content(new).await;
    toggle_insert_state(inserted)
}

#[derive(Debug, Deserialize)]
struct TargetCount {
    target_id: String,
    count: u64,
}

/// Like count per target id, one batched query per kind.
pub async fn counts_for(kind: &str, target_ids: Vec<String>) -> ApiResult<HashMap<String, u64>> {
    if target_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut resp = DB
        .query(
            "SELECT target_id, count() FROM like \
             WHERE target_kind = $kind AND target_id INSIDE $targets GROUP BY target_id",
        )
        .bind(("kind", kind.to_string()))
        .bind(("targets", target_ids))
        .await?;
    let rows: Vec<TargetCount> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| (r.target_id, r.count)).collect())
}

/// Which of the given targets the viewer has liked.
pub async fn liked_set(
    user_id: &str,
    kind: &str,
    target_ids: Vec<String>,
) -> ApiResult<HashSet<String>> {
    if target_ids.is_empty() {
        return Ok(HashSet::new());
    }
    #[derive(Deserialize)]
    struct TargetRow {
        target_id: String,
    }
    let mut resp = DB
        .query(
            "SELECT target_id FROM like WHERE liked_by = $user \
             AND target_kind = $kind AND target_id INSIDE $targets",
        )
        .bind(("user", user_id.to_string()))
        .bind(("kind", kind.to_string()))
        .bind(("targets", target_ids))
        .await?;
    let rows: Vec<TargetRow> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| r.target_id).collect())
}

/// Cascade step: remove likes pointing at the given targets.
pub async fn delete_for_targets(kind: &str, target_ids: Vec<String>) -> ApiResult<()> {
    if target_ids.is_empty() {
        return Ok(());
    }
    DB.query("DELETE like WHERE target_kind = $kind AND target_id INSIDE $targets")
        .bind(("kind", kind.to_string()))
        .bind(("targets", target_ids))
        .await?;
    Ok(())
}
