// src/main.rs
mod api;
mod config;
mod distributor;
mod free_space;
mod geometry;
mod height_map;
mod model;
mod optimizer;
mod orientation;
mod recommender;
mod stability;
mod tiler;
mod types;

use config::AppConfig;

#[tokio::main]
async fn main() {
    // .env may carry RUST_LOG, so it is read before the logger starts
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = dotenv {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            log::warn!("could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let optimizer_config = app_config.optimizer.clone();

    log::info!("load planner starting");
    if let Err(err) = api::start_api_server(api_config, optimizer_config).await {
        log::error!("server terminated: {}", err);
        std::process::exit(1);
    }
}
