//! Voice dialer: a call-session controller over an external voice platform,
//! a microphone level probe, and the thin HTTP backend that mints session
//! credentials and call-routing documents.

pub mod audio;
pub mod call;
pub mod commands;
pub mod config;
pub mod event_channel;
pub mod event_handler;
pub mod platform;
pub mod presentation;
pub mod server;
pub mod session;
pub mod token;

pub use call::{CallError, CallSessionController, CallSnapshot, PhaseKind};
pub use commands::SessionCommand;
pub use session::{SessionHandle, SessionSnapshot};
