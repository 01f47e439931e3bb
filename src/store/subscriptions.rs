use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Deserialize;

use crate::db::DB;
use crate::error::ApiResult;
use crate::models::{NewSubscription, Subscription};
use crate::pagination::PageParams;

use super::{new_key, take_count, toggle_insert_state, CountRow, SUBSCRIPTION};

pub async fn find(subscriber_id: &str, channel_id: &str) -> ApiResult<Option<Subscription>> {
    let mut resp = DB
        .query(
            "SELECT * FROM subscription \
             WHERE subscriber_id = $subscriber AND channel_id = $channel LIMIT 1",
        )
        .bind(("subscriber", subscriber_id.to_string()))
        .bind(("channel", channel_id.to_string()))
        .await?;
    Ok(resp.take(0)?)
}

/// Flip the subscription relation; same duplicate-conflict policy as likes.
pub async fn toggle(subscriber_id: &str, channel_id: &str) -> ApiResult<bool> {
    if let Some(existing) = find(subscriber_id, channel_id).await? {
        let _: Option<Subscription> = DB
            .delete((SUBSCRIPTION, existing.id.key().to_string()))
            .await?;
        return Ok(false);
    }

    let new = NewSubscription {
        subscriber_id: subscriber_id.to_string(),
        channel_id: channel_id.to_string(),
        created_at: Utc::now(),
    };
    let inserted: Result<Option<Subscription>, surrealdb::Error> =
        DB.create((SUBSCRIPTION, new_key())).content(new).await;
    toggle_insert_state(inserted)
}

pub async fn subscriber_count(channel_id: &str) -> ApiResult<u64> {
    let mut resp = DB
        .query("SELECT count() FROM subscription WHERE channel_id = $channel GROUP ALL")
        .bind(("channel", channel_id.to_string()))
        .await?;
    let counts: Vec<CountRow> = resp.take(0)?;
    Ok(take_count(counts))
}

pub async fn subscribed_to_count(subscriber_id: &str) -> ApiResult<u64> {
    let mut resp = DB
        .query("SELECT count() FROM subscription WHERE subscriber_id = $subscriber GROUP ALL")
        .bind(("subscriber", subscriber_id.to_string()))
        .await?;
    let counts: Vec<CountRow> = resp.take(0)?;
    Ok(take_count(counts))
}

#[derive(Debug, Deserialize)]
struct ChannelCount {
    channel_id: String,
    count: u64,
}

/// Subscriber count per channel, batched for owner summaries.
pub async fn counts_for_channels(channel_ids: Vec<String>) -> ApiResult<HashMap<String, u64>> {
    if channel_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut resp = DB
        .query(
            "SELECT channel_id, count() FROM subscription \
             WHERE channel_id INSIDE $channels GROUP BY channel_id",
        )
        .bind(("channels", channel_ids))
        .await?;
    let rows: Vec<ChannelCount> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| (r.channel_id, r.count)).collect())
}

/// Which of the given channels the viewer subscribes to.
pub async fn subscribed_set(
    subscriber_id: &str,
    channel_ids: Vec<String>,
) -> ApiResult<HashSet<String>> {
    if channel_ids.is_empty() {
        return Ok(HashSet::new());
    }
    #[derive(Deserialize)]
    struct ChannelRow {
        channel_id: String,
    }
    let mut resp = DB
        .query(
            "SELECT channel_id FROM subscription \
             WHERE subscriber_id = $subscriber AND channel_id INSIDE $channels",
        )
        .bind(("subscriber", subscriber_id.to_string()))
        .bind(("channels", channel_ids))
        .await?;
    let rows: Vec<ChannelRow> = resp.take(0)?;
    Ok(rows.into_iter().map(|r| r.channel_id).collect())
}

/// Subscribers of a channel, newest first.
pub async fn list_subscribers(
    channel_id: &str,
    page: PageParams,
) -> ApiResult<(Vec<Subscription>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM subscription WHERE channel_id = $channel \
             ORDER BY created_at DESC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM subscription WHERE channel_id = $channel GROUP ALL")
        .bind(("channel", channel_id.to_string()))
        .await?;
    let subs: Vec<Subscription> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((subs, take_count(counts)))
}

/// Channels a user subscribes to, newest first.
pub async fn list_subscribed(
    subscriber_id: &str,
    page: PageParams,
) -> ApiResult<(Vec<Subscription>, u64)> {
    let mut resp = DB
        .query(format!(
            "SELECT * FROM subscription WHERE subscriber_id = $subscriber \
             ORDER BY created_at DESC LIMIT {} START {}",
            page.limit,
            page.skip()
        ))
        .query("SELECT count() FROM subscription WHERE subscriber_id = $subscriber GROUP ALL")
        .bind(("subscriber", subscriber_id.to_string()))
        .await?;
    let subs: Vec<Subscription> = resp.take(0)?;
    let counts: Vec<CountRow> = resp.take(1)?;
    Ok((subs, take_count(counts)))
}
