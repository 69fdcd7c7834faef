//! HTTP backend: session credentials and call routing for the voice platform

pub mod access_token;
pub mod handlers;
pub mod twiml;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;

use crate::config::VoiceServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<VoiceServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: VoiceServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/token", get(handlers::token))
        .route("/voice", post(handlers::voice))
        .route("/health", get(handlers::health))
        .with_state(state)
}
