use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use chrono::Utc;
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::json;

use super::twiml::{self, VoiceResponse};
use super::AppState;
use crate::token::{TokenErrorBody, TokenResponse};

const MISSING_CREDENTIALS: &str =
    "Twilio credentials not configured. Please check your .env.local file.";
const MISSING_CREDENTIALS_HELP: &str = "See docs/TWILIO_FIX_JWT_ERROR.md for setup instructions";
const MINT_FAILED: &str = "Failed to generate access token";
const NO_DESTINATION: &str = "No destination number provided. Goodbye.";
const GENERIC_FAILURE: &str = "An error occurred. Please try again later.";

/// `GET /token`: mint a session credential for a fresh identity
pub async fn token(State(state): State<AppState>) -> Response {
    let settings = &state.config.twilio;
    let Some((issuer, grant)) = settings.issuer(state.config.token_ttl) else {
        let missing = settings.missing();
        warn!("Token requested but credentials are missing: {:?}", missing);
        let body = TokenErrorBody {
            error: MISSING_CREDENTIALS.to_string(),
            missing: missing.into_iter().map(str::to_string).collect(),
            help: Some(MISSING_CREDENTIALS_HELP.to_string()),
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    };

    let now = Utc::now();
    let identity = format!("user_{}", now.timestamp_millis());
    match issuer.mint(&identity, &grant, now) {
        Ok(token) => {
            info!("Issued access token for {}", identity);
            Json(TokenResponse { token, identity }).into_response()
        }
        Err(e) => {
            error!("Error generating access token: {}", e);
            let body = TokenErrorBody {
                error: MINT_FAILED.to_string(),
                missing: Vec::new(),
                help: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VoiceRequest {
    #[serde(rename = "To")]
    pub to: Option<String>,
}

/// `POST /voice`: routing document for an outbound call
pub async fn voice(
    State(state): State<AppState>,
    form: Result<Form<VoiceRequest>, FormRejection>,
) -> Response {
    let document = match form {
        Ok(Form(request)) => match request.to.as_deref().map(str::trim) {
            Some(to) if !to.is_empty() => {
                info!("Routing call to {}", to);
                VoiceResponse::new().dial(state.config.twilio.phone_number.as_deref(), to)
            }
            _ => {
                warn!("Voice request without a destination");
                VoiceResponse::announce_and_hangup(NO_DESTINATION)
            }
        },
        Err(e) => {
            error!("Error generating voice response: {}", e);
            VoiceResponse::announce_and_hangup(GENERIC_FAILURE)
        }
    };

    ([(header::CONTENT_TYPE, twiml::CONTENT_TYPE)], document.to_xml()).into_response()
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started_at.elapsed().as_secs_f64(),
        "environment": state.config.environment,
    }))
}
