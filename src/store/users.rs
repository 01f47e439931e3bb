use chrono::Utc;

use crate::db::DB;
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::models::{NewUser, User, UserPatch};

use super::{new_key, USER};

pub async fn get(key: &str) -> ApiResult<Option<User>> {
    let user: Option<User> = DB.select((USER, key)).await?;
    Ok(user)
}

pub async fn find_by_username(username: &str) -> ApiResult<Option<User>> {
    let mut resp = DB
        .query("SELECT * FROM user WHERE username = $username LIMIT 1")
        .bind(("username", username.to_lowercase()))
        .await?;
    Ok(resp.take(0)?)
}

pub async fn find_by_email(email: &str) -> ApiResult<Option<User>> {
    let mut resp = DB
        .query("SELECT * FROM user WHERE email = $email LIMIT 1")
        .bind(("email", email.to_lowercase()))
        .await?;
    Ok(resp.take(0)?)
}

/// Login accepts either a username or an email.
pub async fn find_by_identifier(identifier: &str) -> ApiResult<Option<User>> {
    if identifier.contains('@') {
        find_by_email(identifier).await
    } else {
        find_by_username(identifier).await
    }
}

/// Insert a new user. Duplicates are reported as 409 with the offending field
/// named; the unique indexes stay as the backstop for concurrent races.
pub async fn create(new: NewUser) -> ApiResult<User> {
    if find_by_email(&new.email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".into()));
    }
    if find_by_username(&new.username).await?.is_some() {
        return Err(ApiError::Conflict("username already taken".into()));
    }

    let created: Option<User> = DB
        .create((USER, new_key()))
        .content(new)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("username or email already registered".into())
            } else {
                ApiError::Database(e)
            }
        })?;

    created.ok_or_else(|| ApiError::Internal("user insert returned nothing".into()))
}

pub async fn merge(key: &str, patch: UserPatch) -> ApiResult<Option<User>> {
    let updated: Option<User> = DB.update((USER, key)).merge(patch).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("email already registered".into())
        } else {
            ApiError::Database(e)
        }
    })?;
    Ok(updated)
}

/// Batched fetch for the composer's owner join.
pub async fn fetch_many(keys: Vec<String>) -> ApiResult<Vec<User>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let mut resp = DB
        .query("SELECT * FROM user WHERE record::id(id) INSIDE $keys")
        .bind(("keys", keys))
        .await?;
    Ok(resp.take(0)?)
}

pub async fn add_refresh_token(key: &str, token: String) -> ApiResult<()> {
    DB.query("UPDATE type::thing('user', $key) SET refresh_tokens += $token")
        .bind(("key", key.to_string()))
        .bind(("token", token))
        .await?;
    Ok(())
}

pub async fn remove_refresh_token(key: &str, token: String) -> ApiResult<()> {
    DB.query("UPDATE type::thing('user', $key) SET refresh_tokens -= $token")
        .bind(("key", key.to_string()))
        .bind(("token", token))
        .await?;
    Ok(())
}

/// Next watch-history state after a watch: the video moves to the front,
/// dropping any earlier occurrence. The returned flag is true when this was
/// the viewer's first watch of the video; the view counter only moves then.
fn rewatched_history(history: &[String], video_id: &str) -> (Vec<String>, bool) {
    let first_watch = !history.iter().any(|v| v == video_id);

    let mut next: Vec<String> = history
        .iter()
        .filter(|v| v.as_str() != video_id)
        .cloned()
        .collect();
    next.insert(0, video_id.to_string());

    (next, first_watch)
}

/// Record a watch; returns true when this was the first watch.
pub async fn record_watch(user: &User, video_id: &str) -> ApiResult<bool> {
    let (history, first_watch) = rewatched_history(&user.watch_history, video_id);

    DB.query("UPDATE type::thing('user', $key) SET watch_history = $history, updated_at = $now")
        .bind(("key", user.key()))
        .bind(("history", history))
        .bind(("now", Utc::now()))
        .await?;

    Ok(first_watch)
}

/// Cascade step of video deletion: drop the id from every watch history.
pub async fn scrub_watch_history(video_id: &str) -> ApiResult<u64> {
    let mut resp = DB
        .query("SELECT count() FROM user WHERE $video INSIDE watch_history GROUP ALL")
        .query("UPDATE user SET watch_history -= $video WHERE $video INSIDE watch_history")
        .bind(("video", video_id.to_string()))
        .await?;
    let touched: Vec<super::CountRow> = resp.take(0)?;
    Ok(super::take_count(touched))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_watch_inserts_at_the_front_and_counts() {
        let (next, first) = rewatched_history(&history(&["v1", "v2"]), "v3");
        assert!(first);
        assert_eq!(next, history(&["v3", "v1", "v2"]));
    }

    #[test]
    fn rewatch_moves_to_front_without_counting() {
        let (next, first) = rewatched_history(&history(&["v1", "v2", "v3"]), "v2");
        assert!(!first);
        assert_eq!(next, history(&["v2", "v1", "v3"]));
    }

    #[test]
    fn rewatch_never_duplicates_the_entry() {
        let (next, _) = rewatched_history(&history(&["v1"]), "v1");
        assert_eq!(next, history(&["v1"]));
    }
}
