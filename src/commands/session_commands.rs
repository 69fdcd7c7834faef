/// Commands sent from the UI to the session task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Fetch a credential and construct the voice device
    Initialize,

    /// Place an outgoing call
    MakeCall { destination: String },

    /// Hang up the current call, connecting or active
    EndCall,

    /// Toggle mute on the active call
    ToggleMute,

    /// Clear the displayed error
    DismissError,

    /// Open the microphone and start reporting its level
    StartMicrophoneTest,

    StopMicrophoneTest,

    /// End any call, release every resource and stop the task
    Shutdown,
}

impl SessionCommand {
    pub fn make_call(destination: impl Into<String>) -> Self {
        SessionCommand::MakeCall {
            destination: destination.into(),
        }
    }
}
