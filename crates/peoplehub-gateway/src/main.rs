//! Peoplehub Gateway - web edge for the HR front-end.
//!
//! Configuration comes from the environment:
//!
//! - `LISTEN_ADDR` (default `0.0.0.0:3000`)
//! - `API_BASE_URL` - backend base URL
//! - `AUTH_LOGIN_PATH`, `AUTH_PROFILE_PATH`, `PEOPLE_PATH`, `EVENTS_PATH`,
//!   `HEALTH_PATH` - backend endpoints
//! - `LOGIN_PAGE_PATH` - path of the login page (default `/login`)
//! - `MONITORING_REFRESH_SECONDS` - dashboard reload interval, `0` to disable
//! - `PUBLIC_PATHS` - comma separated page paths served without a session

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peoplehub_gateway::{create_router, GatewayConfig, GatewayState};

fn load_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();

    if let Ok(addr) = std::env::var("LISTEN_ADDR") {
        config.listen_addr = addr;
    }
    if let Ok(url) = std::env::var("API_BASE_URL") {
        config.auth.api_base_url = url;
    }
    if let Ok(path) = std::env::var("AUTH_LOGIN_PATH") {
        config.auth.login_path = path;
    }
    if let Ok(path) = std::env::var("AUTH_PROFILE_PATH") {
        config.auth.profile_path = path;
    }
    if let Ok(path) = std::env::var("PEOPLE_PATH") {
        config.auth.people_path = path;
    }
    if let Ok(path) = std::env::var("EVENTS_PATH") {
        config.auth.events_path = path;
    }
    if let Ok(path) = std::env::var("HEALTH_PATH") {
        config.auth.health_path = path;
    }
    if let Ok(path) = std::env::var("LOGIN_PAGE_PATH") {
        config.login_path = path;
    }
    if let Some(secs) = std::env::var("MONITORING_REFRESH_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        config.monitoring_refresh_seconds = secs;
    }
    if let Ok(paths) = std::env::var("PUBLIC_PATHS") {
        config.public_paths = paths
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
    }

    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,peoplehub=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Peoplehub Gateway");

    let config = load_config();
    if config.auth.api_base_url.is_empty() {
        tracing::warn!("No API_BASE_URL set - backend calls will fail");
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        api_base_url = %config.auth.api_base_url,
        public_paths = ?config.public_paths,
        "Gateway configuration loaded"
    );

    let listen_addr = config.listen_addr.clone();
    let app = create_router(GatewayState::new(config));

    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
