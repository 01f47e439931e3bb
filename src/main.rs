mod auth;
mod config;
mod db;
mod engagement;
mod error;
mod handlers;
mod logging;
mod media;
mod models;
mod pagination;
mod request_logger;
mod response;
mod search;
mod store;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use tracing_actix_web::TracingLogger;

use crate::config::Config;
use crate::media::MediaStore;
use crate::request_logger::RequestLogger;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    logging::init();

    let config = Config::from_env();

    if let Err(e) = db::connect(&config.db).await {
        tracing::error!("failed to connect to SurrealDB: {e}");
        std::process::exit(1);
    }
    if let Err(e) = db::define_schema().await {
        tracing::error!("failed to define database schema: {e}");
        std::process::exit(1);
    }

    let media = MediaStore::new(&config.media)?;

    let bind = (config.host.clone(), config.port);
    tracing::info!("vidtube listening on http://{}:{}", bind.0, bind.1);

    let config_data = web::Data::new(config);
    let media_data = web::Data::new(media);

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(media_data.clone())
            .wrap(RequestLogger)
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(bind)?
    .run()
    .await
}
