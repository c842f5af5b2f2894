//! API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mosaic_api::{create_router, ApiConfig, AppState};
use mosaic_media::{ensure_model, DetectorConfig, YuNetDetector};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("mosaic_api=info".parse().unwrap())
        .add_directive("mosaic_media=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting mosaic-api");

    let config = ApiConfig::from_env();
    info!("API config: host={}, port={}", config.host, config.port);

    // Model acquisition and detector construction happen once, before the
    // server accepts traffic; failure here is fatal.
    let model_path = match ensure_model(&config.model_dir).await {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to acquire detection model: {}", e);
            std::process::exit(1);
        }
    };

    let detector = match YuNetDetector::load(&model_path, DetectorConfig::default()) {
        Ok(detector) => detector,
        Err(e) => {
            error!("Failed to load detection model: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(config.clone(), Arc::new(detector));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    info!("Server shutdown complete");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
