//! Boundary to the hosted voice platform.
//!
//! The platform owns signalling and media. The dialer only sees a device
//! that can register and place calls, a handle per call that can be muted
//! or hung up, and lifecycle events delivered through a [`PlatformEventSink`].

pub mod simulated;

pub use simulated::SimulatedPlatform;

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

pub use crate::event_handler::PlatformEventSink;

/// Identifies one outbound call attempt. Events are tagged with it so a
/// late event from an earlier attempt is never applied to a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Opus,
    Pcmu,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOptions {
    /// Preferred codecs, most preferred first
    pub codec_preferences: Vec<Codec>,
    /// Regional edge hint for media and signalling
    pub edge: String,
    pub log_level: log::LevelFilter,
}

impl DeviceOptions {
    pub fn with_edge(edge: impl Into<String>) -> Self {
        Self {
            edge: edge.into(),
            ..Self::default()
        }
    }
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            codec_preferences: vec![Codec::Opus, Codec::Pcmu],
            edge: "ashburn".to_string(),
            log_level: log::LevelFilter::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Unregistered,
    Registering,
    Registered,
    Destroyed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Registered,
    Error(String),
    TokenWillExpire,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    Accept,
    Disconnect,
    Cancel,
    Reject,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Device(DeviceEvent),
    Call { call_id: CallId, event: CallEvent },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("device construction failed: {0}")]
    Construction(String),

    #[error("registration failed: {0}")]
    Registration(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("device has been destroyed")]
    Destroyed,
}

/// Routing parameters sent with a connect request (`To`, ...)
pub type ConnectParams = HashMap<String, String>;

/// A registered endpoint on the voice platform
#[async_trait::async_trait]
pub trait VoiceDevice: Send + Sync {
    fn state(&self) -> DeviceState;

    /// Register with the platform. This is where microphone access is first requested.
    async fn register(&self) -> Result<(), PlatformError>;

    async fn connect(&self, call_id: CallId, params: ConnectParams) -> Result<Box<dyn CallHandle>, PlatformError>;

    fn update_token(&self, token: &str);

    fn destroy(&self);
}

/// One established or in-progress call
pub trait CallHandle: Send + Sync {
    fn id(&self) -> CallId;

    fn mute(&self, muted: bool);

    fn disconnect(&self);
}

/// Builds devices from a session credential
pub trait DeviceFactory: Send + Sync {
    fn create(
        &self,
        token: &str,
        options: &DeviceOptions,
        events: PlatformEventSink,
    ) -> Result<Box<dyn VoiceDevice>, PlatformError>;
}
