use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::models::{NotificationKind, OwnerSummary, Subscription};
use crate::pagination::{PageMeta, PageQuery};
use crate::response::ApiResponse;
use crate::store;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(toggle_subscription)
        .service(list_subscribers)
        .service(list_subscribed_channels);
}

#[derive(Debug, Serialize)]
struct ToggleOutcome {
    subscribed: bool,
}

#[post("/subscriptions/{channelId}/toggle")]
async fn toggle_subscription(auth: AuthUser, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let channel_key = path.into_inner();

    if channel_key == auth.0.key() {
        return Err(ApiError::invalid(
            "channelId",
            "you cannot subscribe to your own channel",
        ));
    }

    let channel = store::users::get(&channel_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel not found".into()))?;

    let subscribed = store::subscriptions::toggle(&auth.0.key(), &channel_key).await?;

    if subscribed {
        store::notifications::best_effort(store::notifications::engagement_notification(
            channel.key(),
            NotificationKind::Subscription,
            auth.0.key(),
            None,
        ))
        .await;
    }

    Ok(ApiResponse::ok(
        "subscription toggled",
        ToggleOutcome { subscribed },
    ))
}

/// Turn subscription rows into the user profiles on one side of the relation.
async fn resolve_profiles(
    subs: &[Subscription],
    pick: fn(&Subscription) -> &String,
) -> ApiResult<Vec<OwnerSummary>> {
    let ids: Vec<String> = subs.iter().map(|s| pick(s).clone()).collect();
    let users = store::users::fetch_many(ids.clone()).await?;
    let counts = store::subscriptions::counts_for_channels(ids.clone()).await?;

    let mut by_key: std::collections::HashMap<String, OwnerSummary> = users
        .into_iter()
        .map(|u| {
            let key = u.key();
            let mut summary = u.owner_summary();
            summary.subscribers_count = Some(counts.get(&key).copied().unwrap_or(0));
            (key, summary)
        })
        .collect();

    // Preserve subscription order; drop rows whose user is gone.
    Ok(ids.iter().filter_map(|id| by_key.remove(id)).collect())
}

#[get("/subscriptions/{channelId}/subscribers")]
async fn list_subscribers(
    _auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let channel_key = path.into_inner();
    store::users::get(&channel_key)
        .await?
        .ok_or_else(|| ApiError::NotFound("channel not found".into()))?;

    let params = query.resolve();
    let (subs, total) = store::subscriptions::list_subscribers(&channel_key, params).await?;
    let profiles = resolve_profiles(&subs, |s| &s.subscriber_id).await?;
    Ok(ApiResponse::paginated(
        "subscribers",
        profiles,
        PageMeta::from_params(params, total),
    ))
}

#[get("/subscriptions/me/channels")]
async fn list_subscribed_channels(
    auth: AuthUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let params = query.resolve();
    let (subs, total) = store::subscriptions::list_subscribed(&auth.0.key(), params).await?;
    let profiles = resolve_profiles(&subs, |s| &s.channel_id).await?;
    Ok(ApiResponse::paginated(
        "subscribed channels",
        profiles,
        PageMeta::from_params(params, total),
    ))
}
