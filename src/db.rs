use std::sync::LazyLock;

use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

use crate::config::DbConfig;

pub static DB: LazyLock<Surreal<Client>> = LazyLock::new(Surreal::init);

pub async fn connect(cfg: &DbConfig) -> Result<(), surrealdb::Error> {
    DB.connect::<Ws>(cfg.endpoint.as_str()).await?;

    DB.signin(Root {
        username: &cfg.username,
        password: &cfg.password,
    })
    .await?;

    DB.use_ns(&cfg.namespace).use_db(&cfg.database).await?;

    tracing::info!("connected to SurrealDB at {}", cfg.endpoint);

    Ok(())
}

/// Tables are schemaless; the indexes below are the uniqueness backstops the
/// toggle and registration paths rely on.
pub async fn define_schema() -> Result<(), surrealdb::Error> {
    DB.query(
        r#"
        DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS user_username_idx ON TABLE user COLUMNS username UNIQUE;
        DEFINE INDEX IF NOT EXISTS user_email_idx ON TABLE user COLUMNS email UNIQUE;

        DEFINE TABLE IF NOT EXISTS video SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS video_owner_idx ON TABLE video COLUMNS owner_id;

        DEFINE TABLE IF NOT EXISTS comment SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS comment_video_idx ON TABLE comment COLUMNS video_id;

        DEFINE TABLE IF NOT EXISTS like SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS like_unique_idx
            ON TABLE like COLUMNS target_kind, target_id, liked_by UNIQUE;

        DEFINE TABLE IF NOT EXISTS subscription SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS subscription_unique_idx
            ON TABLE subscription COLUMNS subscriber_id, channel_id UNIQUE;

        DEFINE TABLE IF NOT EXISTS playlist SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS playlist_owner_idx ON TABLE playlist COLUMNS owner_id;

        DEFINE TABLE IF NOT EXISTS notification SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS notification_recipient_idx
            ON TABLE notification COLUMNS recipient_id;

        DEFINE TABLE IF NOT EXISTS report SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS report_unique_idx
            ON TABLE report COLUMNS reporter_id, target_kind, target_id UNIQUE;
        "#,
    )
    .await?;

    tracing::info!("database schema ensured");

    Ok(())
}
