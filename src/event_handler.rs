use log::{debug, error, info};
use tokio::sync::mpsc;

use crate::platform::{CallEvent, CallId, DeviceEvent, PlatformEvent};

/// Bridges voice platform callbacks into the session task.
///
/// Platform implementations hold one of these and report every device and
/// call lifecycle event through it; the session task drains the other end.
#[derive(Clone, Debug)]
pub struct PlatformEventSink {
    event_sender: mpsc::UnboundedSender<PlatformEvent>,
}

impl PlatformEventSink {
    pub fn new(event_sender: mpsc::UnboundedSender<PlatformEvent>) -> Self {
        Self { event_sender }
    }

    pub fn device(&self, event: DeviceEvent) {
        match &event {
            DeviceEvent::Error(message) => error!("Device error: {}", message),
            other => info!("Device event: {:?}", other),
        }

        if let Err(e) = self.event_sender.send(PlatformEvent::Device(event)) {
            error!("Failed to send device event: {}", e);
        }
    }

    pub fn call(&self, call_id: CallId, event: CallEvent) {
        match &event {
            CallEvent::Error(message) => error!("Call {} error: {}", call_id, message),
            other => debug!("Call {} event: {:?}", call_id, other),
        }

        if let Err(e) = self.event_sender.send(PlatformEvent::Call { call_id, event }) {
            error!("Failed to send call event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_channel::EventChannel;

    #[tokio::test]
    async fn forwards_events_in_order() {
        let mut channel = EventChannel::new();
        let sink = channel.sink();
        let call_id = CallId::new();

        sink.device(DeviceEvent::Registered);
        sink.call(call_id, CallEvent::Accept);

        assert_eq!(
            channel.receiver.recv().await,
            Some(PlatformEvent::Device(DeviceEvent::Registered))
        );
        assert_eq!(
            channel.receiver.recv().await,
            Some(PlatformEvent::Call {
                call_id,
                event: CallEvent::Accept
            })
        );
    }

    #[test]
    fn closed_channel_does_not_panic() {
        let channel = EventChannel::new();
        let sink = channel.sink();
        drop(channel);
        sink.device(DeviceEvent::TokenWillExpire);
    }
}
