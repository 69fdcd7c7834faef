// Call session controller and its state machine

pub mod controller;
pub mod state;

pub use controller::CallSessionController;
pub use state::{CallPhase, CallSnapshot, PhaseKind};

use thiserror::Error;

/// Failures surfaced through the controller's latest-error slot
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallError {
    /// Credential fetch or device construction failed; fatal until re-initialized
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Registration or connection failed; the controller stays ready
    #[error("{0}")]
    CallSetup(String),

    /// Asynchronous error reported by the device or an active call
    #[error("{0}")]
    Platform(String),
}
