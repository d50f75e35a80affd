use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod models;
mod server;
mod services;
mod utils;

use api::polygon::PolygonClient;
use config::AppConfig;
use server::AppState;
use utils::clock::SystemClock;

const DEFAULT_LOG_DIRECTIVES: &str = "spark_graph=debug,tower_http=info,hyper=warn";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting spark graph service v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Loaded configuration: {:?}", config);

    let client = match PolygonClient::new(
        config.polygon_api_key.clone(),
        config.polygon_base_url.clone(),
        config.request_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Polygon client: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        credentials: Arc::new(config.credentials.clone()),
        provider: Arc::new(client),
        clock: Arc::new(SystemClock),
        request_timeout: config.request_timeout,
        cache_max_age_secs: config.cache_max_age_secs,
    };

    let address = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", address, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", address);

    if let Err(e) = server::run(listener, state).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Spark graph service stopped");
}
