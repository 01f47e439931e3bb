pub mod comments;
pub mod likes;
pub mod notifications;
pub mod playlists;
pub mod reports;
pub mod subscriptions;
pub mod users;
pub mod videos;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(users::configure)
            .configure(videos::configure)
            .configure(comments::configure)
            .configure(likes::configure)
            .configure(subscriptions::configure)
            .configure(playlists::configure)
            .configure(notifications::configure)
            .configure(reports::configure),
    );
}
