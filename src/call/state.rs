use crate::platform::{CallHandle, CallId};

use super::CallError;

/// A call that has been requested but not yet accepted
pub struct PendingCall {
    pub handle: Box<dyn CallHandle>,
    pub destination: String,
}

/// An accepted call. Mute and duration only exist here.
pub struct ActiveCall {
    pub handle: Box<dyn CallHandle>,
    pub destination: String,
    pub duration_secs: u64,
    pub muted: bool,
}

/// Lifecycle of the controller and its (at most one) call
pub enum CallPhase {
    Uninitialized,
    Ready,
    Connecting(PendingCall),
    Active(ActiveCall),
}

impl CallPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            CallPhase::Uninitialized => PhaseKind::Uninitialized,
            CallPhase::Ready => PhaseKind::Ready,
            CallPhase::Connecting(_) => PhaseKind::Connecting,
            CallPhase::Active(_) => PhaseKind::Active,
        }
    }

    pub fn call_id(&self) -> Option<CallId> {
        match self {
            CallPhase::Connecting(call) => Some(call.handle.id()),
            CallPhase::Active(call) => Some(call.handle.id()),
            _ => None,
        }
    }

    pub fn destination(&self) -> Option<&str> {
        match self {
            CallPhase::Connecting(call) => Some(&call.destination),
            CallPhase::Active(call) => Some(&call.destination),
            _ => None,
        }
    }

    pub fn has_call(&self) -> bool {
        self.call_id().is_some()
    }
}

impl std::fmt::Debug for CallPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallPhase::Uninitialized => write!(f, "Uninitialized"),
            CallPhase::Ready => write!(f, "Ready"),
            CallPhase::Connecting(call) => f
                .debug_struct("Connecting")
                .field("call_id", &call.handle.id())
                .field("destination", &call.destination)
                .finish(),
            CallPhase::Active(call) => f
                .debug_struct("Active")
                .field("call_id", &call.handle.id())
                .field("destination", &call.destination)
                .field("duration_secs", &call.duration_secs)
                .field("muted", &call.muted)
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseKind {
    #[default]
    Uninitialized,
    Ready,
    Connecting,
    Active,
}

/// Read-only view of the controller for the presentation layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallSnapshot {
    pub phase: PhaseKind,
    pub is_ready: bool,
    pub is_call_active: bool,
    pub is_muted: bool,
    pub duration_secs: u64,
    pub destination: Option<String>,
    pub identity: Option<String>,
    pub last_error: Option<CallError>,
}

impl CallSnapshot {
    pub fn error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(|e| e.to_string())
    }
}
