// src/main.rs
use stuffing_visualizer::{AppConfig, api};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            log::warn!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    log::info!("🚀 Stuffing visualizer starting...");
    if let Err(err) = api::start_api_server(app_config).await {
        log::error!("❌ API server terminated with an error: {}", err);
        std::process::exit(1);
    }
}
