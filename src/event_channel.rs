use tokio::sync::mpsc;

use crate::event_handler::PlatformEventSink;
use crate::platform::PlatformEvent;

/// Channel for passing platform events from device callbacks to the session task
pub struct EventChannel {
    pub sender: mpsc::UnboundedSender<PlatformEvent>,
    pub receiver: mpsc::UnboundedReceiver<PlatformEvent>,
}

impl EventChannel {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    pub fn sink(&self) -> PlatformEventSink {
        PlatformEventSink::new(self.sender.clone())
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}
