use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::audio::{AudioLevelMonitor, CaptureSource, MonitorConfig, ProbeError};
use crate::call::{CallSessionController, CallSnapshot};
use crate::commands::SessionCommand;
use crate::config::DialerConfig;
use crate::event_channel::EventChannel;
use crate::platform::{CallId, DeviceFactory, DeviceOptions, PlatformEvent};
use crate::token::{HttpTokenProvider, TokenError, TokenProvider};

const TICK: Duration = Duration::from_secs(1);

/// State of the microphone self-test
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MicrophoneSnapshot {
    pub level: f32,
    pub tested: bool,
    pub error: Option<ProbeError>,
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub call: CallSnapshot,
    pub microphone: MicrophoneSnapshot,
}

/// Client side of the session task: send commands, watch snapshots.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Spawn the task that owns the controller and the level monitor
    pub fn spawn(
        token_provider: Arc<dyn TokenProvider>,
        device_factory: Arc<dyn DeviceFactory>,
        device_options: DeviceOptions,
        capture_source: Arc<dyn CaptureSource>,
        monitor_config: MonitorConfig,
    ) -> Self {
        let channel = EventChannel::new();
        let controller = CallSessionController::new(
            token_provider,
            device_factory,
            device_options,
            channel.sink(),
        );
        let monitor = AudioLevelMonitor::new(capture_source, monitor_config);
        let levels = monitor.subscribe();

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

        let runner = SessionRunner {
            controller,
            monitor,
            commands: command_rx,
            events: channel.receiver,
            levels,
            ticker: None,
            microphone_error: None,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(runner.run());

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    /// Session backed by the HTTP token endpoint named in `config`
    pub fn from_config(
        config: &DialerConfig,
        device_factory: Arc<dyn DeviceFactory>,
        capture_source: Arc<dyn CaptureSource>,
    ) -> Result<Self, TokenError> {
        let provider = HttpTokenProvider::new(
            config.token_url.clone(),
            config.token_timeout,
            config.credential_ttl,
        )?;
        Ok(Self::spawn(
            Arc::new(provider),
            device_factory,
            DeviceOptions::with_edge(config.edge.clone()),
            capture_source,
            MonitorConfig::new().with_frame_interval(config.microphone_frame_interval),
        ))
    }

    /// Queue a command; false once the task has stopped
    pub fn send(&self, command: SessionCommand) -> bool {
        match self.commands.send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!("Session task has stopped, dropping {:?}", e.0);
                false
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Tear everything down and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Err(e) = self.task.await {
            warn!("Session task ended abnormally: {}", e);
        }
    }
}

struct SessionRunner {
    controller: CallSessionController,
    monitor: AudioLevelMonitor,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    events: mpsc::UnboundedReceiver<PlatformEvent>,
    levels: watch::Receiver<f32>,
    // Duration clock, armed only while a call is active
    ticker: Option<(CallId, Interval)>,
    microphone_error: Option<ProbeError>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionRunner {
    async fn run(mut self) {
        info!("Session task started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command).await,
                },

                Some(event) = self.events.recv() => {
                    self.controller.handle_event(event);
                }

                _ = self.controller.refresh_completed() => {}

                _ = next_tick(&mut self.ticker) => {
                    if let Some(secs) = self.controller.tick() {
                        debug!("Call duration {}s", secs);
                    }
                }

                Ok(()) = self.levels.changed() => {}
            }

            self.sync_ticker();
            self.publish();
        }

        self.monitor.stop();
        self.controller.shutdown();
        self.ticker = None;
        self.publish();
        info!("Session task stopped");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        debug!("Session command {:?}", command);
        match command {
            SessionCommand::Initialize => {
                let _ = self.controller.initialize().await;
            }
            SessionCommand::MakeCall { destination } => {
                if let Ok(call_id) = self.controller.make_call(&destination).await {
                    debug!("Call {} is connecting", call_id);
                }
            }
            SessionCommand::EndCall => self.controller.end_call(),
            SessionCommand::ToggleMute => {
                self.controller.toggle_mute();
            }
            SessionCommand::DismissError => {
                self.controller.dismiss_error();
                self.microphone_error = None;
            }
            SessionCommand::StartMicrophoneTest => {
                self.microphone_error = self.monitor.start().await.err();
            }
            SessionCommand::StopMicrophoneTest => {
                self.monitor.stop();
                self.microphone_error = None;
            }
            SessionCommand::Shutdown => {}
        }
    }

    /// Restart the clock when a new call becomes active, drop it otherwise
    fn sync_ticker(&mut self) {
        match (self.ticker.as_ref().map(|(id, _)| *id), self.controller.active_call_id()) {
            (Some(current), Some(active)) if current == active => {}
            (_, Some(active)) => {
                let mut interval = interval_at(Instant::now() + TICK, TICK);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some((active, interval));
            }
            (_, None) => self.ticker = None,
        }
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot {
            call: self.controller.snapshot(),
            microphone: MicrophoneSnapshot {
                level: self.monitor.level(),
                tested: self.monitor.is_tested(),
                error: self.microphone_error.clone(),
            },
        };
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

async fn next_tick(ticker: &mut Option<(CallId, Interval)>) {
    match ticker {
        Some((_, interval)) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
