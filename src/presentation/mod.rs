// UI-independent view logic for the dial pad and call controls

pub mod control_state;
pub mod dial_input;

pub use control_state::{ButtonStyle, CallControlState};
pub use dial_input::{format_duration, DialInput, DialKey, DialValidationError, DIAL_KEYS};
