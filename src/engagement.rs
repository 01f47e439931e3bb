//! The engagement composer: enriches stored records with derived social
//! fields (owner profile, like/comment counts, viewer flags) before they are
//! served.
//!
//! Each join input is fetched in one batched query, then stitched together by
//! pure functions so the shaping logic is testable without a database.

use std::collections::{HashMap, HashSet};

use crate::error::ApiResult;
use crate::models::{ChannelProfile, Comment, CommentView, OwnerSummary, User, Video, VideoView};
use crate::store;

/// Everything needed to enrich a batch of videos or comments, fetched up
/// front. `viewer_likes` and `viewer_subs` stay empty for anonymous viewers,
/// which makes every flag compose to false.
#[derive(Debug, Default)]
pub struct EngagementContext {
    pub owners: HashMap<String, OwnerSummary>,
    pub like_counts: HashMap<String, u64>,
    pub comment_counts: HashMap<String, u64>,
    pub reply_counts: HashMap<String, u64>,
    pub viewer_likes: HashSet<String>,
    pub viewer_subs: HashSet<String>,
}

fn deleted_owner(owner_id: &str) -> OwnerSummary {
    OwnerSummary {
        id: owner_id.to_string(),
        username: "deleted".into(),
        full_name: "Deleted User".into(),
        avatar_url: None,
        subscribers_count: None,
    }
}

/// Pure join: video + context → client view. Untouched videos compose to
/// zero counts, never an error.
pub fn compose_video_view(video: &Video, ctx: &EngagementContext) -> VideoView {
    let key = video.key();
    let owner = ctx
        .owners
        .get(&video.owner_id)
        .cloned()
        .unwrap_or_else(|| deleted_owner(&video.owner_id));

    VideoView {
        id: key.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        video_url: video.video_url.clone(),
        thumbnail_url: video.thumbnail_url.clone(),
        duration: video.duration,
        views: video.views,
        is_published: video.is_published,
        category: video.category.clone(),
        tags: video.tags.clone(),
        created_at: video.created_at,
        is_subscribed: ctx.viewer_subs.contains(&video.owner_id),
        owner,
        likes_count: ctx.like_counts.get(&key).copied().unwrap_or(0),
        comments_count: ctx.comment_counts.get(&key).copied().unwrap_or(0),
        is_liked: ctx.viewer_likes.contains(&key),
    }
}

/// Pure join for comments; `reply_counts` is keyed by parent comment id.
pub fn compose_comment_view(comment: &Comment, ctx: &EngagementContext) -> CommentView {
    let key = comment.key();
    let owner = ctx
        .owners
        .get(&comment.owner_id)
        .cloned()
        .unwrap_or_else(|| deleted_owner(&comment.owner_id));

    CommentView {
        id: key.clone(),
        content: comment.content.clone(),
        video_id: comment.video_id.clone(),
        parent_id: comment.parent_id.clone(),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        owner,
        likes_count: ctx.like_counts.get(&key).copied().unwrap_or(0),
        replies_count: ctx.reply_counts.get(&key).copied().unwrap_or(0),
        is_liked: ctx.viewer_likes.contains(&key),
    }
}

fn owner_summaries(
    owners: Vec<User>,
    subscriber_counts: &HashMap<String, u64>,
) -> HashMap<String, OwnerSummary> {
    owners
        .into_iter()
        .map(|u| {
            let key = u.key();
            let mut summary = u.owner_summary();
            summary.subscribers_count = Some(subscriber_counts.get(&key).copied().unwrap_or(0));
            (key, summary)
        })
        .collect()
}

/// Enrich a batch of videos for an optional viewer.
pub async fn enrich_videos(videos: &[Video], viewer: Option<&str>) -> ApiResult<Vec<VideoView>> {
    if videos.is_empty() {
        return Ok(Vec::new());
    }

    let video_ids: Vec<String> = videos.iter().map(|v| v.key()).collect();
    let mut owner_ids: Vec<String> = videos.iter().map(|v| v.owner_id.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();

    let owners = store::users::fetch_many(owner_ids.clone()).await?;
    let subscriber_counts = store::subscriptions::counts_for_channels(owner_ids.clone()).await?;
    let like_counts = store::likes::counts_for("video", video_ids.clone()).await?;
    let comment_counts = store::comments::counts_for_videos(video_ids.clone()).await?;

    let (viewer_likes, viewer_subs) = match viewer {
        Some(viewer_id) => (
            store::likes::liked_set(viewer_id, "video", video_ids).await?,
            store::subscriptions::subscribed_set(viewer_id, owner_ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    let ctx = EngagementContext {
        owners: owner_summaries(owners, &subscriber_counts),
        like_counts,
        comment_counts,
        reply_counts: HashMap::new(),
        viewer_likes,
        viewer_subs,
    };

    Ok(videos.iter().map(|v| compose_video_view(v, &ctx)).collect())
}

pub async fn enrich_video(video: &Video, viewer: Option<&str>) -> ApiResult<VideoView> {
    let mut views = enrich_videos(std::slice::from_ref(video), viewer).await?;
    Ok(views.remove(0))
}

/// Enrich a batch of comments for an optional viewer.
pub async fn enrich_comments(
    comments: &[Comment],
    viewer: Option<&str>,
) -> ApiResult<Vec<CommentView>> {
    if comments.is_empty() {
        return Ok(Vec::new());
    }

    let comment_ids: Vec<String> = comments.iter().map(|c| c.key()).collect();
    let mut owner_ids: Vec<String> = comments.iter().map(|c| c.owner_id.clone()).collect();
    owner_ids.sort();
    owner_ids.dedup();

    let owners = store::users::fetch_many(owner_ids).await?;
    let like_counts = store::likes::counts_for("comment", comment_ids.clone()).await?;
    let reply_counts = store::comments::reply_counts(comment_ids.clone()).await?;

    let viewer_likes = match viewer {
        Some(viewer_id) => store::likes::liked_set(viewer_id, "comment", comment_ids).await?,
        None => HashSet::new(),
    };

    let ctx = EngagementContext {
        owners: owner_summaries(owners, &HashMap::new()),
        like_counts,
        comment_counts: HashMap::new(),
        reply_counts,
        viewer_likes,
        viewer_subs: HashSet::new(),
    };

    Ok(comments
        .iter()
        .map(|c| compose_comment_view(c, &ctx))
        .collect())
}

/// Channel page: public profile plus subscription counts and viewer flag.
pub async fn channel_profile(channel: &User, viewer: Option<&str>) -> ApiResult<ChannelProfile> {
    let channel_id = channel.key();
    let subscribers_count = store::subscriptions::subscriber_count(&channel_id).await?;
    let subscribed_to_count = store::subscriptions::subscribed_to_count(&channel_id).await?;
    let is_subscribed = match viewer {
        Some(viewer_id) => store::subscriptions::find(viewer_id, &channel_id)
            .await?
            .is_some(),
        None => false,
    };

    Ok(ChannelProfile {
        id: channel_id,
        username: channel.username.clone(),
        full_name: channel.full_name.clone(),
        avatar_url: channel.avatar_url.clone(),
        cover_url: channel.cover_url.clone(),
        subscribers_count,
        subscribed_to_count,
        is_subscribed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use surrealdb::RecordId;

    fn video(key: &str, owner: &str) -> Video {
        Video {
            id: RecordId::from_table_key("video", key),
            title: "A title".into(),
            description: "words".into(),
            video_url: "http://cdn/v.mp4".into(),
            video_public_id: "v".into(),
            thumbnail_url: "http://cdn/t.jpg".into(),
            thumbnail_public_id: "t".into(),
            duration: 12.5,
            views: 3,
            is_published: true,
            owner_id: owner.into(),
            category: None,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn owner(id: &str) -> OwnerSummary {
        OwnerSummary {
            id: id.into(),
            username: "alice".into(),
            full_name: "Alice".into(),
            avatar_url: None,
            subscribers_count: Some(7),
        }
    }

    #[test]
    fn zero_engagement_composes_to_zero_counts() {
        let ctx = EngagementContext {
            owners: HashMap::from([("u1".to_string(), owner("u1"))]),
            ..Default::default()
        };
        let view = compose_video_view(&video("v1", "u1"), &ctx);
        assert_eq!(view.likes_count, 0);
        assert_eq!(view.comments_count, 0);
        assert!(!view.is_liked);
        assert!(!view.is_subscribed);
        assert_eq!(view.owner.username, "alice");
    }

    #[test]
    fn anonymous_viewer_flags_stay_false() {
        let ctx = EngagementContext {
            owners: HashMap::from([("u1".to_string(), owner("u1"))]),
            like_counts: HashMap::from([("v1".to_string(), 42)]),
            comment_counts: HashMap::from([("v1".to_string(), 9)]),
            // Empty viewer sets model an unauthenticated request.
            ..Default::default()
        };
        let view = compose_video_view(&video("v1", "u1"), &ctx);
        assert_eq!(view.likes_count, 42);
        assert_eq!(view.comments_count, 9);
        assert!(!view.is_liked);
        assert!(!view.is_subscribed);
    }

    #[test]
    fn viewer_flags_come_from_membership_sets() {
        let ctx = EngagementContext {
            owners: HashMap::from([("u1".to_string(), owner("u1"))]),
            like_counts: HashMap::from([("v1".to_string(), 1)]),
            viewer_likes: HashSet::from(["v1".to_string()]),
            viewer_subs: HashSet::from(["u1".to_string()]),
            ..Default::default()
        };
        let view = compose_video_view(&video("v1", "u1"), &ctx);
        assert!(view.is_liked);
        assert!(view.is_subscribed);

        let other = compose_video_view(&video("v2", "u2"), &ctx);
        assert!(!other.is_liked);
        assert!(!other.is_subscribed);
    }

    #[test]
    fn missing_owner_falls_back_to_deleted_placeholder() {
        let ctx = EngagementContext::default();
        let view = compose_video_view(&video("v1", "gone"), &ctx);
        assert_eq!(view.owner.username, "deleted");
        assert_eq!(view.owner.id, "gone");
    }

    #[test]
    fn comment_view_uses_reply_counts() {
        let comment = Comment {
            id: RecordId::from_table_key("comment", "c1"),
            content: "nice".into(),
            video_id: "v1".into(),
            owner_id: "u1".into(),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let ctx = EngagementContext {
            owners: HashMap::from([("u1".to_string(), owner("u1"))]),
            like_counts: HashMap::from([("c1".to_string(), 5)]),
            reply_counts: HashMap::from([("c1".to_string(), 2)]),
            viewer_likes: HashSet::from(["c1".to_string()]),
            ..Default::default()
        };
        let view = compose_comment_view(&comment, &ctx);
        assert_eq!(view.likes_count, 5);
        assert_eq!(view.replies_count, 2);
        assert!(view.is_liked);
    }
}
