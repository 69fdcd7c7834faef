use anyhow::Context;
use log::{error, info, warn};
use tokio::net::TcpListener;

use voice_dialer::config::VoiceServerConfig;
use voice_dialer::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();
    env_logger::init();

    let config = VoiceServerConfig::from_env().context("Failed to load server configuration")?;
    config.validate()?;

    let missing = config.twilio.missing();
    if !missing.is_empty() {
        warn!("Token minting disabled until these are set: {}", missing.join(", "));
    }

    info!(
        "Starting voice_server v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    let bind_addr = config.bind_addr;
    let app = server::router(AppState::new(config));
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
