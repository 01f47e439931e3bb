//! Application-side relevance ranking for video search.
//!
//! Candidates are pre-filtered by the store (substring match on title,
//! description or tags); scoring and ordering happen here so the weighting is
//! a pure, testable function.

use chrono::{DateTime, Utc};

use crate::models::Video;

const TITLE_WEIGHT: f64 = 4.0;
const TITLE_EXACT_BONUS: f64 = 2.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;
const TAG_WEIGHT: f64 = 1.5;
const VIEW_BOOST: f64 = 0.1;
const LIKE_BOOST: f64 = 0.2;
const RECENCY_BOOST: f64 = 0.5;
const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

/// Relevance of one video for a query. Title matches dominate description
/// matches by construction: the view/like/recency boosts are logarithmic or
/// bounded and cannot add up to `TITLE_WEIGHT - DESCRIPTION_WEIGHT` for any
/// realistic engagement numbers.
pub fn relevance_score(video: &Video, likes: u64, query: &str, now: DateTime<Utc>) -> f64 {
    let needle = query.to_lowercase();
    let title = video.title.to_lowercase();
    let description = video.description.to_lowercase();

    let mut score = 0.0;

    if title.contains(&needle) {
        score += TITLE_WEIGHT;
        if title == needle {
            score += TITLE_EXACT_BONUS;
        }
    }
    if description.contains(&needle) {
        score += DESCRIPTION_WEIGHT;
    }
    if video.tags.iter().any(|t| t.to_lowercase() == needle) {
        score += TAG_WEIGHT;
    }

    score += VIEW_BOOST * ((video.views as f64) + 1.0).ln();
    score += LIKE_BOOST * ((likes as f64) + 1.0).ln();

    let age_days = (now - video.created_at).num_seconds().max(0) as f64 / 86_400.0;
    score += RECENCY_BOOST / (1.0 + age_days / RECENCY_HALF_LIFE_DAYS);

    score
}

/// Order candidates by score, ties broken by newest first.
pub fn rank(
    mut videos: Vec<Video>,
    likes: &std::collections::HashMap<String, u64>,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<Video> {
    let mut scored: Vec<(f64, Video)> = videos
        .drain(..)
        .map(|v| {
            let like_count = likes.get(&v.key()).copied().unwrap_or(0);
            (relevance_score(&v, like_count, query, now), v)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.1.created_at.cmp(&a.1.created_at))
    });

    scored.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashMap;
    use surrealdb::RecordId;

    fn video(key: &str, title: &str, description: &str, created_at: DateTime<Utc>) -> Video {
        Video {
            id: RecordId::from_table_key("video", key),
            title: title.into(),
            description: description.into(),
            video_url: String::new(),
            video_public_id: String::new(),
            thumbnail_url: String::new(),
            thumbnail_public_id: String::new(),
            duration: 10.0,
            views: 0,
            is_published: true,
            owner_id: "u1".into(),
            category: None,
            tags: vec![],
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn title_match_outranks_description_match() {
        let now = Utc::now();
        let title_hit = video("a", "Cooking pasta at home", "nothing relevant", now);
        let desc_hit = video("b", "Unrelated", "a video about cooking pasta", now);

        let ranked = rank(
            vec![desc_hit.clone(), title_hit.clone()],
            &HashMap::new(),
            "pasta",
            now,
        );
        assert_eq!(ranked[0].key(), "a");
        assert_eq!(ranked[1].key(), "b");
    }

    #[test]
    fn title_match_survives_heavy_engagement_on_description_match() {
        let now = Utc::now();
        let title_hit = video("a", "rust tutorial", "", now - Duration::days(300));
        let mut desc_hit = video("b", "other", "a rust tutorial for all", now);
        desc_hit.views = 1_000_000;

        let likes = HashMap::from([("b".to_string(), 50_000u64)]);
        let ranked = rank(vec![desc_hit, title_hit], &likes, "rust tutorial", now);
        assert_eq!(ranked[0].key(), "a");
    }

    #[test]
    fn exact_title_beats_partial_title() {
        let now = Utc::now();
        let exact = video("a", "pasta", "", now);
        let partial = video("b", "pasta carbonara for beginners", "", now);

        let ranked = rank(vec![partial, exact], &HashMap::new(), "pasta", now);
        assert_eq!(ranked[0].key(), "a");
    }

    #[test]
    fn ties_break_newest_first() {
        let now = Utc::now();
        let older = video("a", "same title", "", now - Duration::days(2));
        let newer = video("b", "same title", "", now - Duration::days(1));

        let ranked = rank(vec![older, newer], &HashMap::new(), "zebra", now);
        // Neither matches, both score only the boosts; newer has more recency.
        assert_eq!(ranked[0].key(), "b");
    }

    #[test]
    fn views_and_likes_break_ties_between_equal_matches() {
        let now = Utc::now();
        let mut popular = video("a", "pasta guide", "", now);
        popular.views = 10_000;
        let obscure = video("b", "pasta guide", "", now);

        let likes = HashMap::from([("a".to_string(), 100u64)]);
        let ranked = rank(vec![obscure, popular], &likes, "pasta", now);
        assert_eq!(ranked[0].key(), "a");
    }
}
