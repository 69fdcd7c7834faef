use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, error, info};
use serde::Deserialize;

use super::{SessionCredential, TokenError, TokenProvider};

/// Either shape `GET /token` may answer with
#[derive(Debug, Deserialize)]
struct TokenEnvelope {
    token: Option<String>,
    identity: Option<String>,
    error: Option<String>,
}

/// Lifetime claims of a platform access token
#[derive(Debug, Deserialize)]
struct TokenLifetime {
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
}

/// Read `iat`/`exp` from a JWT without checking its signature, which only
/// the platform can do. `None` when the token is not a JWT.
fn token_lifetime(token: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let claims = decode::<TokenLifetime>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()?
        .claims;
    let expires_at = DateTime::from_timestamp(claims.exp, 0)?;
    let issued_at = claims
        .iat
        .and_then(|iat| DateTime::from_timestamp(iat, 0))
        .unwrap_or_else(Utc::now);
    Some((issued_at, expires_at))
}

/// Fetches session credentials from the voice backend over HTTP.
///
/// Every request is bounded by `timeout`; a hung backend surfaces as
/// [`TokenError::Timeout`] rather than an indefinite wait. Expiry comes from
/// the token's `exp` claim, `credential_ttl` is used for opaque tokens.
#[derive(Debug, Clone)]
pub struct HttpTokenProvider {
    client: reqwest::Client,
    url: String,
    credential_ttl: Duration,
}

impl HttpTokenProvider {
    pub fn new(url: impl Into<String>, timeout: Duration, credential_ttl: Duration) -> Result<Self, TokenError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TokenError::Http(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            credential_ttl,
        })
    }
}

fn map_request_error(e: reqwest::Error) -> TokenError {
    if e.is_timeout() {
        TokenError::Timeout
    } else {
        TokenError::Http(e.to_string())
    }
}

#[async_trait::async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_credential(&self) -> Result<SessionCredential, TokenError> {
        debug!("Requesting session credential from {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(map_request_error)?;
        let status = response.status();
        let body = response.json::<TokenEnvelope>().await;

        if !status.is_success() {
            let message = body
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| "Failed to get token".to_string());
            error!("Token endpoint answered {}: {}", status, message);
            return Err(TokenError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = body.map_err(|e| {
            if e.is_timeout() {
                TokenError::Timeout
            } else {
                TokenError::Decode(e.to_string())
            }
        })?;
        let token = envelope
            .token
            .ok_or_else(|| TokenError::Decode("response has no token".to_string()))?;
        let identity = envelope.identity.unwrap_or_default();

        let credential = match token_lifetime(&token) {
            Some((issued_at, expires_at)) => {
                SessionCredential::with_expiry(token, identity, issued_at, expires_at)
            }
            None => {
                debug!("Token carries no readable expiry, assuming {:?}", self.credential_ttl);
                SessionCredential::new(token, identity, Utc::now(), self.credential_ttl)
            }
        };
        info!(
            "Obtained session credential for {}, valid until {}",
            credential.identity(),
            credential.expires_at()
        );
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::access_token::{AccessTokenIssuer, VoiceGrant};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/token", addr)
    }

    fn provider(url: String, timeout: Duration) -> HttpTokenProvider {
        HttpTokenProvider::new(url, timeout, Duration::from_secs(3600)).unwrap()
    }

    #[tokio::test]
    async fn returns_credential_on_success() {
        let url = serve(Router::new().route(
            "/token",
            get(|| async { Json(json!({"token": "abc.def.ghi", "identity": "user_42"})) }),
        ))
        .await;

        let credential = provider(url, Duration::from_secs(5)).fetch_credential().await.unwrap();
        assert_eq!(credential.token(), "abc.def.ghi");
        assert_eq!(credential.identity(), "user_42");
        assert!(!credential.is_expired());
    }

    #[tokio::test]
    async fn expiry_comes_from_the_minted_token() {
        let issuer = AccessTokenIssuer::new(
            "AC123".to_string(),
            "SK456".to_string(),
            "secret".to_string(),
            Duration::from_secs(600),
        );
        let grant = VoiceGrant {
            outgoing_application_sid: "AP789".to_string(),
            incoming_allow: true,
        };
        let issued = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap();
        let token = issuer.mint("user_42", &grant, issued).unwrap();

        let url = serve(Router::new().route(
            "/token",
            get(move || {
                let token = token.clone();
                async move { Json(json!({"token": token, "identity": "user_42"})) }
            }),
        ))
        .await;

        // The client's own hour-long default must not win over the token
        let credential = provider(url, Duration::from_secs(5)).fetch_credential().await.unwrap();
        assert_eq!(credential.issued_at(), issued);
        assert_eq!(credential.expires_at(), issued + chrono::Duration::seconds(600));
        assert!(credential.is_expired_at(issued + chrono::Duration::seconds(601)));
    }

    #[tokio::test]
    async fn opaque_token_uses_the_configured_ttl() {
        let url = serve(Router::new().route(
            "/token",
            get(|| async { Json(json!({"token": "opaque", "identity": "user_42"})) }),
        ))
        .await;

        let before = Utc::now();
        let credential = HttpTokenProvider::new(url, Duration::from_secs(5), Duration::from_secs(90))
            .unwrap()
            .fetch_credential()
            .await
            .unwrap();
        assert_eq!(
            credential.expires_at() - credential.issued_at(),
            chrono::Duration::seconds(90)
        );
        assert!(credential.issued_at() >= before);
    }

    #[tokio::test]
    async fn surfaces_server_error_message() {
        let url = serve(Router::new().route(
            "/token",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "missing config", "missing": ["X"]})),
                )
            }),
        ))
        .await;

        let err = provider(url, Duration::from_secs(5)).fetch_credential().await.unwrap_err();
        assert_eq!(
            err,
            TokenError::Status {
                status: 500,
                message: "missing config".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_json_failure_gets_generic_message() {
        let url = serve(Router::new().route(
            "/token",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        ))
        .await;

        let err = provider(url, Duration::from_secs(5)).fetch_credential().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get token");
    }

    #[tokio::test]
    async fn hung_backend_times_out() {
        let url = serve(Router::new().route(
            "/token",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"token": "late", "identity": "late"}))
            }),
        ))
        .await;

        let err = provider(url, Duration::from_millis(100)).fetch_credential().await.unwrap_err();
        assert_eq!(err, TokenError::Timeout);
    }
}
