//! Persistence layer: one module per entity, all talking to the process-wide
//! SurrealDB handle. Joins are done application-side from batched fetches, so
//! every query here stays a flat select, count or mutation.

pub mod comments;
pub mod likes;
pub mod notifications;
pub mod playlists;
pub mod reports;
pub mod subscriptions;
pub mod users;
pub mod videos;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiResult};

pub const USER: &str = "user";
pub const VIDEO: &str = "video";
pub const COMMENT: &str = "comment";
pub const LIKE: &str = "like";
pub const SUBSCRIPTION: &str = "subscription";
pub const PLAYLIST: &str = "playlist";
pub const NOTIFICATION: &str = "notification";
pub const REPORT: &str = "report";

/// Fresh record key. Hyphen-free so keys stay inert inside query strings.
pub(crate) fn new_key() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub count: u64,
}

pub(crate) fn take_count(rows: Vec<CountRow>) -> u64 {
    rows.first().map(|r| r.count).unwrap_or(0)
}

/// Map a toggle's insert result to the relation's new state. A unique-index
/// conflict means a concurrent toggle already inserted the row, so the
/// relation is on either way; any other failure propagates.
pub(crate) fn toggle_insert_state<T>(
    inserted: Result<Option<T>, surrealdb::Error>,
) -> ApiResult<bool> {
    match inserted {
        Ok(_) => Ok(true),
        Err(e) if is_unique_violation(&e) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn db_error(message: &str) -> surrealdb::Error {
        surrealdb::Error::Api(surrealdb::error::Api::Query(message.to_string()))
    }

    #[test]
    fn successful_insert_turns_the_relation_on() {
        assert!(toggle_insert_state(Ok(Some(()))).unwrap());
        assert!(toggle_insert_state::<()>(Ok(None)).unwrap());
    }

    #[test]
    fn duplicate_insert_conflict_reports_on() {
        let conflict = db_error(
            "Database index `like_unique_idx` already contains \
             ['video', 'v1', 'u1'], with record like:x",
        );
        assert!(toggle_insert_state::<()>(Err(conflict)).unwrap());
    }

    #[test]
    fn other_insert_failures_propagate() {
        let err = toggle_insert_state::<()>(Err(db_error("connection reset"))).unwrap_err();
        assert!(matches!(err, ApiError::Database(_)));
    }
}
