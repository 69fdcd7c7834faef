use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;

use super::{
    CallEvent, CallHandle, CallId, ConnectParams, DeviceEvent, DeviceFactory, DeviceOptions,
    DeviceState, PlatformError, PlatformEventSink, VoiceDevice,
};

/// How the simulated platform reacts to requests
#[derive(Debug, Clone, Default)]
pub struct SimulatedBehavior {
    /// Accept every call after this delay; `None` leaves calls ringing until an event is injected
    pub answer_after: Option<Duration>,
    pub construction_failure: Option<String>,
    pub registration_failure: Option<String>,
    pub connect_failure: Option<String>,
}

/// Everything the dialer asked the platform to do, in order
#[derive(Debug, Clone, Default)]
pub struct PlatformLog {
    pub created_with: Vec<String>,
    pub options: Option<DeviceOptions>,
    pub token_updates: Vec<String>,
    pub registrations: usize,
    pub connects: Vec<(CallId, ConnectParams)>,
    pub mutes: Vec<(CallId, bool)>,
    pub disconnects: Vec<CallId>,
    pub destroyed: usize,
}

struct Shared {
    behavior: Mutex<SimulatedBehavior>,
    log: Mutex<PlatformLog>,
    sink: Mutex<Option<PlatformEventSink>>,
}

/// In-process stand-in for the hosted voice platform.
///
/// Drives the desktop demo when no real platform is wired up (calls are
/// answered after a short delay) and backs the controller tests, where
/// lifecycle events are injected by hand.
#[derive(Clone)]
pub struct SimulatedPlatform {
    shared: Arc<Shared>,
}

impl SimulatedPlatform {
    pub fn new(behavior: SimulatedBehavior) -> Self {
        Self {
            shared: Arc::new(Shared {
                behavior: Mutex::new(behavior),
                log: Mutex::new(PlatformLog::default()),
                sink: Mutex::new(None),
            }),
        }
    }

    /// Calls stay in progress until an event is injected
    pub fn manual() -> Self {
        Self::new(SimulatedBehavior::default())
    }

    pub fn auto_answer(delay: Duration) -> Self {
        Self::new(SimulatedBehavior {
            answer_after: Some(delay),
            ..SimulatedBehavior::default()
        })
    }

    pub fn set_behavior(&self, behavior: SimulatedBehavior) {
        *self.shared.behavior.lock() = behavior;
    }

    pub fn log(&self) -> PlatformLog {
        self.shared.log.lock().clone()
    }

    pub fn last_call_id(&self) -> Option<CallId> {
        self.shared.log.lock().connects.last().map(|(id, _)| *id)
    }

    pub fn emit_device(&self, event: DeviceEvent) {
        match self.shared.sink.lock().as_ref() {
            Some(sink) => sink.device(event),
            None => warn!("No device created yet, dropping {:?}", event),
        }
    }

    pub fn emit_call(&self, call_id: CallId, event: CallEvent) {
        match self.shared.sink.lock().as_ref() {
            Some(sink) => sink.call(call_id, event),
            None => warn!("No device created yet, dropping {:?}", event),
        }
    }
}

impl DeviceFactory for SimulatedPlatform {
    fn create(
        &self,
        token: &str,
        options: &DeviceOptions,
        events: PlatformEventSink,
    ) -> Result<Box<dyn VoiceDevice>, PlatformError> {
        if let Some(reason) = self.shared.behavior.lock().construction_failure.clone() {
            return Err(PlatformError::Construction(reason));
        }

        info!(
            "Creating simulated device (edge: {}, codecs: {:?})",
            options.edge, options.codec_preferences
        );
        {
            let mut log = self.shared.log.lock();
            log.created_with.push(token.to_string());
            log.options = Some(options.clone());
        }
        *self.shared.sink.lock() = Some(events);

        Ok(Box::new(SimulatedDevice {
            shared: self.shared.clone(),
            state: Mutex::new(DeviceState::Unregistered),
        }))
    }
}

struct SimulatedDevice {
    shared: Arc<Shared>,
    state: Mutex<DeviceState>,
}

impl SimulatedDevice {
    fn sink(&self) -> Option<PlatformEventSink> {
        self.shared.sink.lock().clone()
    }

    fn ensure_alive(&self) -> Result<(), PlatformError> {
        if *self.state.lock() == DeviceState::Destroyed {
            return Err(PlatformError::Destroyed);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl VoiceDevice for SimulatedDevice {
    fn state(&self) -> DeviceState {
        *self.state.lock()
    }

    async fn register(&self) -> Result<(), PlatformError> {
        self.ensure_alive()?;
        *self.state.lock() = DeviceState::Registering;

        if let Some(reason) = self.shared.behavior.lock().registration_failure.clone() {
            *self.state.lock() = DeviceState::Unregistered;
            return Err(PlatformError::Registration(reason));
        }

        *self.state.lock() = DeviceState::Registered;
        self.shared.log.lock().registrations += 1;
        if let Some(sink) = self.sink() {
            sink.device(DeviceEvent::Registered);
        }
        Ok(())
    }

    async fn connect(&self, call_id: CallId, params: ConnectParams) -> Result<Box<dyn CallHandle>, PlatformError> {
        self.ensure_alive()?;

        let answer_after = {
            let behavior = self.shared.behavior.lock();
            if let Some(reason) = behavior.connect_failure.clone() {
                return Err(PlatformError::Connection(reason));
            }
            behavior.answer_after
        };

        debug!("Simulated connect {} with {:?}", call_id, params);
        self.shared.log.lock().connects.push((call_id, params));

        if let (Some(delay), Some(sink)) = (answer_after, self.sink()) {
            let shared = self.shared.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if !shared.log.lock().disconnects.contains(&call_id) {
                    sink.call(call_id, CallEvent::Accept);
                }
            });
        }

        Ok(Box::new(SimulatedCall {
            id: call_id,
            shared: self.shared.clone(),
        }))
    }

    fn update_token(&self, token: &str) {
        self.shared.log.lock().token_updates.push(token.to_string());
    }

    fn destroy(&self) {
        *self.state.lock() = DeviceState::Destroyed;
        self.shared.log.lock().destroyed += 1;
    }
}

struct SimulatedCall {
    id: CallId,
    shared: Arc<Shared>,
}

impl CallHandle for SimulatedCall {
    fn id(&self) -> CallId {
        self.id
    }

    fn mute(&self, muted: bool) {
        self.shared.log.lock().mutes.push((self.id, muted));
    }

    fn disconnect(&self) {
        self.shared.log.lock().disconnects.push(self.id);
        // The platform confirms a local hangup with its own disconnect event
        let sink = self.shared.sink.lock().clone();
        if let Some(sink) = sink {
            sink.call(self.id, CallEvent::Disconnect);
        }
    }
}
