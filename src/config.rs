use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::server::access_token::{AccessTokenIssuer, VoiceGrant};

/// Default token lifetime handed out by the backend (one hour)
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("{0} is required in production")]
    RequiredInProduction(&'static str),
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Load(e.to_string())
    }
}

/// Voice platform account settings used to mint tokens and route calls.
///
/// Every field is optional at load time; `/token` reports the missing ones
/// instead of refusing to start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TwilioSettings {
    pub account_sid: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub twiml_app_sid: Option<String>,
    pub phone_number: Option<String>,
}

impl TwilioSettings {
    /// Names of the variables required for token minting that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.account_sid.is_none() {
            missing.push("TWILIO_ACCOUNT_SID");
        }
        if self.api_key.is_none() {
            missing.push("TWILIO_API_KEY");
        }
        if self.api_secret.is_none() {
            missing.push("TWILIO_API_SECRET");
        }
        if self.twiml_app_sid.is_none() {
            missing.push("TWILIO_TWIML_APP_SID");
        }
        missing
    }

    /// Build the token issuer and voice grant, or `None` when any credential is missing
    pub fn issuer(&self, ttl: Duration) -> Option<(AccessTokenIssuer, VoiceGrant)> {
        let issuer = AccessTokenIssuer::new(
            self.account_sid.clone()?,
            self.api_key.clone()?,
            self.api_secret.clone()?,
            ttl,
        );
        let grant = VoiceGrant {
            outgoing_application_sid: self.twiml_app_sid.clone()?,
            incoming_allow: true,
        };
        Some((issuer, grant))
    }
}

/// Variables read by `voice_server`. Field names are the lower-cased
/// environment keys.
#[derive(Debug, Serialize, Deserialize)]
struct ServerEnv {
    voice_server_addr: String,
    app_env: String,
    voice_token_ttl_secs: u64,
    twilio_account_sid: Option<String>,
    twilio_api_key: Option<String>,
    twilio_api_secret: Option<String>,
    twilio_twiml_app_sid: Option<String>,
    twilio_phone_number: Option<String>,
}

impl Default for ServerEnv {
    fn default() -> Self {
        Self {
            voice_server_addr: "127.0.0.1:3000".to_string(),
            app_env: "development".to_string(),
            voice_token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            twilio_account_sid: None,
            twilio_api_key: None,
            twilio_api_secret: None,
            twilio_twiml_app_sid: None,
            twilio_phone_number: None,
        }
    }
}

/// Variables read by the desktop dialer
#[derive(Debug, Serialize, Deserialize)]
struct DialerEnv {
    voice_token_url: String,
    voice_edge: String,
    voice_token_timeout_secs: u64,
    voice_token_ttl_secs: u64,
}

impl Default for DialerEnv {
    fn default() -> Self {
        Self {
            voice_token_url: "http://127.0.0.1:3000/token".to_string(),
            voice_edge: "ashburn".to_string(),
            voice_token_timeout_secs: 10,
            voice_token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

/// Layer the environment over the defaults of `T`.
///
/// `vars` replaces the process environment when given. Empty variables
/// fall back to the defaults.
fn load<T>(vars: Option<HashMap<String, String>>) -> Result<T, ConfigError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let settings = config::Config::builder()
        .add_source(config::Config::try_from(&T::default())?)
        .add_source(config::Environment::default().ignore_empty(true).source(vars))
        .build()?;
    Ok(settings.try_deserialize()?)
}

/// Trimmed value, `None` when blank
fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone)]
pub struct VoiceServerConfig {
    pub bind_addr: SocketAddr,
    pub environment: String,
    pub token_ttl: Duration,
    pub twilio: TwilioSettings,
}

impl Default for VoiceServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            environment: "development".to_string(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            twilio: TwilioSettings::default(),
        }
    }
}

impl VoiceServerConfig {
    /// Load from the process environment (call `dotenv` first to pick up `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_settings(load(None)?)
    }

    /// Load from an explicit set of variables instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_settings(load(Some(vars))?)
    }

    fn from_settings(env: ServerEnv) -> Result<Self, ConfigError> {
        let bind_addr = env
            .voice_server_addr
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "VOICE_SERVER_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            bind_addr,
            environment: env.app_env.trim().to_string(),
            token_ttl: Duration::from_secs(env.voice_token_ttl_secs),
            twilio: TwilioSettings {
                account_sid: present(env.twilio_account_sid),
                api_key: present(env.twilio_api_key),
                api_secret: present(env.twilio_api_secret),
                twiml_app_sid: present(env.twilio_twiml_app_sid),
                phone_number: present(env.twilio_phone_number),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Production deployments must dial out with a caller ID
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.twilio.phone_number.is_none() {
            return Err(ConfigError::RequiredInProduction("TWILIO_PHONE_NUMBER"));
        }
        Ok(())
    }
}

/// Settings for the desktop dialer
#[derive(Debug, Clone)]
pub struct DialerConfig {
    pub token_url: String,
    pub edge: String,
    pub token_timeout: Duration,
    pub credential_ttl: Duration,
    pub answer_delay: Duration,
    pub microphone_frame_interval: Duration,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self::from_settings(DialerEnv::default())
    }
}

impl DialerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::from_settings(load(None)?))
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Self::from_settings(load(Some(vars))?))
    }

    fn from_settings(env: DialerEnv) -> Self {
        Self {
            token_url: env.voice_token_url.trim().to_string(),
            edge: env.voice_edge.trim().to_string(),
            token_timeout: Duration::from_secs(env.voice_token_timeout_secs),
            credential_ttl: Duration::from_secs(env.voice_token_ttl_secs),
            answer_delay: Duration::from_secs(2),
            microphone_frame_interval: Duration::from_millis(16),
        }
    }
}
