// Commands sent from the presentation layer to the session task

pub mod session_commands;

pub use session_commands::SessionCommand;
