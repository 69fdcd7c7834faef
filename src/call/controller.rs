use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::event_handler::PlatformEventSink;
use crate::platform::{
    CallEvent, CallHandle, CallId, ConnectParams, DeviceEvent, DeviceFactory, DeviceOptions,
    DeviceState, PlatformError, PlatformEvent, VoiceDevice,
};
use crate::token::{SessionCredential, TokenError, TokenProvider};

use super::state::{ActiveCall, CallPhase, CallSnapshot, PendingCall};
use super::CallError;

/// Owns the voice device, the session credential and the single call.
///
/// All transitions happen through `&mut self`: the session task feeds it
/// user commands, platform events and duration ticks one at a time.
pub struct CallSessionController {
    token_provider: Arc<dyn TokenProvider>,
    device_factory: Arc<dyn DeviceFactory>,
    device_options: DeviceOptions,
    events: PlatformEventSink,
    device: Option<Box<dyn VoiceDevice>>,
    credential: Option<SessionCredential>,
    device_ready: bool,
    phase: CallPhase,
    last_error: Option<CallError>,
    // Replacement credential being fetched in the background
    refresh: Option<JoinHandle<Result<SessionCredential, TokenError>>>,
}

impl CallSessionController {
    pub fn new(
        token_provider: Arc<dyn TokenProvider>,
        device_factory: Arc<dyn DeviceFactory>,
        device_options: DeviceOptions,
        events: PlatformEventSink,
    ) -> Self {
        Self {
            token_provider,
            device_factory,
            device_options,
            events,
            device: None,
            credential: None,
            device_ready: false,
            phase: CallPhase::Uninitialized,
            last_error: None,
            refresh: None,
        }
    }

    /// Fetch a credential and build the device.
    ///
    /// Registration is left for the first call so that microphone access is
    /// only requested in response to a direct user action.
    pub async fn initialize(&mut self) -> Result<(), CallError> {
        if !matches!(self.phase, CallPhase::Uninitialized) {
            debug!("Controller already initialized");
            return Ok(());
        }

        info!("Initializing call session controller");
        let credential = match self.token_provider.fetch_credential().await {
            Ok(credential) => credential,
            Err(e) => return Err(self.record(CallError::Initialization(e.to_string()))),
        };

        let device = match self
            .device_factory
            .create(credential.token(), &self.device_options, self.events.clone())
        {
            Ok(device) => device,
            Err(e) => return Err(self.record(CallError::Initialization(e.to_string()))),
        };

        info!(
            "Voice device ready for {} (edge: {})",
            credential.identity(),
            self.device_options.edge
        );
        self.device = Some(device);
        self.credential = Some(credential);
        self.device_ready = true;
        self.last_error = None;
        self.phase = CallPhase::Ready;
        Ok(())
    }

    /// Start an outbound call. Returns as soon as the platform has a call
    /// handle; acceptance arrives later as a [`CallEvent::Accept`].
    pub async fn make_call(&mut self, destination: &str) -> Result<CallId, CallError> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(self.record(CallError::CallSetup("Please enter a phone number".to_string())));
        }
        if self.phase.has_call() {
            return Err(self.record(CallError::CallSetup("A call is already in progress".to_string())));
        }
        if !self.device_ready || self.device.is_none() || !matches!(self.phase, CallPhase::Ready) {
            return Err(self.record(CallError::CallSetup("Device not ready".to_string())));
        }
        match &self.credential {
            Some(credential) if !credential.is_expired() => {}
            _ => {
                return Err(self.record(CallError::CallSetup(
                    "Session credential has expired".to_string(),
                )))
            }
        }

        self.last_error = None;
        let call_id = CallId::new();
        info!("Making call {} to {}", call_id, destination);
        let result = match self.device.as_deref() {
            Some(device) => establish(device, call_id, destination).await,
            None => Err(PlatformError::Destroyed),
        };

        match result {
            Ok(handle) => {
                self.phase = CallPhase::Connecting(PendingCall {
                    handle,
                    destination: destination.to_string(),
                });
                Ok(call_id)
            }
            Err(e) => Err(self.record(CallError::CallSetup(format!("Failed to make call: {}", e)))),
        }
    }

    /// Hang up. Local state resets immediately; the platform's own
    /// disconnect event for this call is ignored when it arrives.
    pub fn end_call(&mut self) {
        match self.take_call() {
            Some(handle) => {
                info!("Ending call {}", handle.id());
                handle.disconnect();
            }
            None => debug!("end_call with no call in progress"),
        }
    }

    /// Flip the mute flag of the active call; `None` when no call is active
    pub fn toggle_mute(&mut self) -> Option<bool> {
        let CallPhase::Active(call) = &mut self.phase else {
            debug!("toggle_mute with no active call");
            return None;
        };
        call.muted = !call.muted;
        call.handle.mute(call.muted);
        info!("Call {} muted: {}", call.handle.id(), call.muted);
        Some(call.muted)
    }

    /// One second of call time; returns the new duration while active
    pub fn tick(&mut self) -> Option<u64> {
        match &mut self.phase {
            CallPhase::Active(call) => {
                call.duration_secs += 1;
                Some(call.duration_secs)
            }
            _ => None,
        }
    }

    pub fn handle_event(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::Device(event) => self.handle_device_event(event),
            PlatformEvent::Call { call_id, event } => self.handle_call_event(call_id, event),
        }
    }

    fn handle_device_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Registered => {
                info!("Voice device registered");
                self.device_ready = true;
                self.last_error = None;
            }
            DeviceEvent::Error(message) => {
                self.device_ready = false;
                if let Some(handle) = self.take_call() {
                    warn!("Dropping call {} after device error", handle.id());
                    handle.disconnect();
                }
                self.record(CallError::Platform(message));
            }
            DeviceEvent::TokenWillExpire => self.begin_refresh(),
        }
    }

    fn handle_call_event(&mut self, call_id: CallId, event: CallEvent) {
        if self.phase.call_id() != Some(call_id) {
            debug!("Ignoring {:?} for stale call {}", event, call_id);
            return;
        }

        match event {
            CallEvent::Accept => {
                let phase = std::mem::replace(&mut self.phase, CallPhase::Ready);
                self.phase = match phase {
                    CallPhase::Connecting(pending) => {
                        info!("Call {} accepted", call_id);
                        CallPhase::Active(ActiveCall {
                            handle: pending.handle,
                            destination: pending.destination,
                            duration_secs: 0,
                            muted: false,
                        })
                    }
                    other => other,
                };
            }
            CallEvent::Disconnect => {
                info!("Call {} disconnected", call_id);
                self.take_call();
            }
            CallEvent::Cancel => {
                info!("Call {} cancelled", call_id);
                self.take_call();
            }
            CallEvent::Reject => {
                info!("Call {} rejected", call_id);
                self.take_call();
                self.record(CallError::Platform("Call was rejected".to_string()));
            }
            CallEvent::Error(message) => {
                self.take_call();
                self.record(CallError::Platform(message));
            }
        }
    }

    /// Start fetching a replacement credential. The fetch runs on its own
    /// task so calls, mute and the duration clock keep going meanwhile.
    fn begin_refresh(&mut self) {
        if self.refresh.is_some() {
            debug!("Credential refresh already in flight");
            return;
        }
        if self.device.is_none() {
            debug!("No device to refresh a credential for");
            return;
        }
        info!("Session credential will expire, refreshing");
        let provider = self.token_provider.clone();
        self.refresh = Some(tokio::spawn(async move { provider.fetch_credential().await }));
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_some()
    }

    /// Wait for the in-flight refresh and apply its result. Never resolves
    /// while no refresh is running. Failures are only logged: the current
    /// credential keeps working until it actually expires.
    ///
    /// Cancel safe: dropping the future leaves the refresh in flight.
    pub async fn refresh_completed(&mut self) {
        let result = match self.refresh.as_mut() {
            Some(task) => task.await,
            None => std::future::pending().await,
        };
        self.refresh = None;

        match result {
            Ok(Ok(credential)) => {
                if let Some(device) = &self.device {
                    device.update_token(credential.token());
                }
                info!("Session credential refreshed, valid until {}", credential.expires_at());
                self.credential = Some(credential);
            }
            Ok(Err(e)) => warn!("Failed to refresh session credential: {}", e),
            Err(e) => warn!("Credential refresh task ended abnormally: {}", e),
        }
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// End any call and release the device and credential
    pub fn shutdown(&mut self) {
        if let Some(refresh) = self.refresh.take() {
            refresh.abort();
        }
        self.end_call();
        if let Some(device) = self.device.take() {
            info!("Destroying voice device");
            device.destroy();
        }
        self.credential = None;
        self.device_ready = false;
        self.phase = CallPhase::Uninitialized;
    }

    pub fn phase(&self) -> &CallPhase {
        &self.phase
    }

    /// Id of the accepted call, if any
    pub fn active_call_id(&self) -> Option<CallId> {
        match &self.phase {
            CallPhase::Active(call) => Some(call.handle.id()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.device_ready && !matches!(self.phase, CallPhase::Uninitialized)
    }

    pub fn last_error(&self) -> Option<&CallError> {
        self.last_error.as_ref()
    }

    pub fn credential(&self) -> Option<&SessionCredential> {
        self.credential.as_ref()
    }

    pub fn snapshot(&self) -> CallSnapshot {
        let (duration_secs, is_muted) = match &self.phase {
            CallPhase::Active(call) => (call.duration_secs, call.muted),
            _ => (0, false),
        };
        CallSnapshot {
            phase: self.phase.kind(),
            is_ready: self.is_ready(),
            is_call_active: matches!(self.phase, CallPhase::Active(_)),
            is_muted,
            duration_secs,
            destination: self.phase.destination().map(str::to_string),
            identity: self.credential.as_ref().map(|c| c.identity().to_string()),
            last_error: self.last_error.clone(),
        }
    }

    /// Clear the call (if any) and return its handle. Uninitialized stays uninitialized.
    fn take_call(&mut self) -> Option<Box<dyn CallHandle>> {
        if !self.phase.has_call() {
            return None;
        }
        match std::mem::replace(&mut self.phase, CallPhase::Ready) {
            CallPhase::Connecting(call) => Some(call.handle),
            CallPhase::Active(call) => Some(call.handle),
            other => {
                self.phase = other;
                None
            }
        }
    }

    fn record(&mut self, err: CallError) -> CallError {
        error!("{}", err);
        self.last_error = Some(err.clone());
        err
    }
}

async fn establish(
    device: &dyn VoiceDevice,
    call_id: CallId,
    destination: &str,
) -> Result<Box<dyn CallHandle>, PlatformError> {
    if device.state() == DeviceState::Unregistered {
        info!("Registering device before first call");
        device.register().await?;
    }

    let mut params = ConnectParams::new();
    params.insert("To".to_string(), destination.to_string());
    device.connect(call_id, params).await
}

impl Drop for CallSessionController {
    fn drop(&mut self) {
        if self.device.is_some() || self.phase.has_call() || self.refresh.is_some() {
            self.shutdown();
        }
    }
}
