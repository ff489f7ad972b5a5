mod classifier;
mod config;
mod error;
mod handlers;
mod models;
mod routes;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::{error, info};

use crate::config::AppConfig;
use crate::models::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let default_filter = config
        .as_ref()
        .map(AppConfig::default_log_filter)
        .unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();

    let config = config.map_err(|e| {
        error!("Invalid configuration: {:#}", e);
        e
    })?;

    let classifier = classifier::load_classifier(&config.model_path);
    let state = web::Data::new(AppState::new(classifier).with_payload_limit(config.payload_limit));

    let (host, port) = config.bind_address();
    info!("Server running at http://{}:{}", host, port);
    info!(
        "Deployment: {:?}, CORS origins: {:?}, preflight: {:?}",
        config.deployment, config.cors.origins, config.cors.preflight
    );

    let policy = config.cors.clone();
    let liveness_route = config.liveness_route();

    HttpServer::new(move || {
        let policy = policy.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(|cfg| routes::register(cfg, &policy, liveness_route))
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
