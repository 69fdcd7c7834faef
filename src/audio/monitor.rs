use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{normalized_level, CaptureSource, CaptureStream, FrequencyAnalyser, MonitorConfig, ProbeError};

/// Microphone self-test: samples the input level once per frame while running.
///
/// Independent of the call controller; failures here never affect call state.
pub struct AudioLevelMonitor {
    config: MonitorConfig,
    source: Arc<dyn CaptureSource>,
    stream: Option<Box<dyn CaptureStream>>,
    sampler: Option<JoinHandle<()>>,
    level: watch::Sender<f32>,
    // Closed on stop so a frame computed concurrently is never published
    gate: Arc<Mutex<bool>>,
    tested: bool,
}

impl AudioLevelMonitor {
    pub fn new(source: Arc<dyn CaptureSource>, config: MonitorConfig) -> Self {
        let (level, _) = watch::channel(0.0);
        Self {
            config,
            source,
            stream: None,
            sampler: None,
            level,
            gate: Arc::new(Mutex::new(false)),
            tested: false,
        }
    }

    /// Request the microphone and begin sampling. No-op while already running.
    pub async fn start(&mut self) -> Result<(), ProbeError> {
        if self.is_running() {
            debug!("Level monitor already running");
            return Ok(());
        }

        let stream = match self
            .source
            .open(self.config.constraints, self.config.fft_size)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Microphone test failed: {}", e);
                return Err(e);
            }
        };

        let window = stream.window();
        let gate = Arc::new(Mutex::new(true));
        let level = self.level.clone();
        let fft_size = self.config.fft_size;
        let frame_interval = self.config.frame_interval;
        let task_gate = gate.clone();

        let sampler = tokio::spawn(async move {
            let mut analyser = FrequencyAnalyser::new(fft_size);
            let mut samples = vec![0.0f32; analyser.fft_size()];
            let mut bins = vec![0u8; analyser.frequency_bin_count()];
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                window.copy_latest(&mut samples);
                analyser.byte_frequency_data(&samples, &mut bins);
                let value = normalized_level(&bins);

                let open = task_gate.lock();
                if !*open {
                    break;
                }
                level.send_replace(value);
            }
        });

        info!("Microphone test started");
        self.stream = Some(stream);
        self.sampler = Some(sampler);
        self.gate = gate;
        self.tested = true;
        Ok(())
    }

    /// Stop sampling, release the microphone and zero the level.
    /// Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        *self.gate.lock() = false;
        if let Some(sampler) = self.sampler.take() {
            sampler.abort();
        }
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Microphone test stopped");
        }
        self.level.send_replace(0.0);
        self.tested = false;
    }

    pub fn is_running(&self) -> bool {
        self.sampler.is_some()
    }

    /// True once capture has been acquired, until stopped
    pub fn is_tested(&self) -> bool {
        self.tested
    }

    pub fn level(&self) -> f32 {
        *self.level.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.level.subscribe()
    }
}

impl Drop for AudioLevelMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{CaptureConstraints, SampleWindow};
    use async_trait::async_trait;
    use std::f32::consts::PI;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Yields a window pre-filled with a loud tone, or a scripted failure
    struct ScriptedSource {
        failure: Option<ProbeError>,
        opened: AtomicUsize,
        stopped: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn tone() -> Arc<Self> {
            Arc::new(Self {
                failure: None,
                opened: AtomicUsize::new(0),
                stopped: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn failing(err: ProbeError) -> Arc<Self> {
            Arc::new(Self {
                failure: Some(err),
                opened: AtomicUsize::new(0),
                stopped: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    struct ScriptedStream {
        window: Arc<SampleWindow>,
        stopped: Arc<AtomicUsize>,
    }

    impl CaptureStream for ScriptedStream {
        fn window(&self) -> Arc<SampleWindow> {
            self.window.clone()
        }

        fn stop(&mut self) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CaptureSource for ScriptedSource {
        async fn open(
            &self,
            _constraints: CaptureConstraints,
            window_len: usize,
        ) -> Result<Box<dyn CaptureStream>, ProbeError> {
            if let Some(err) = &self.failure {
                return Err(err.clone());
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            let window = Arc::new(SampleWindow::new(window_len));
            let samples: Vec<f32> = (0..window_len)
                .map(|i| 0.8 * (2.0 * PI * 8.0 * i as f32 / window_len as f32).sin())
                .collect();
            window.push(&samples);
            Ok(Box::new(ScriptedStream {
                window,
                stopped: self.stopped.clone(),
            }))
        }
    }

    fn monitor(source: Arc<ScriptedSource>) -> AudioLevelMonitor {
        AudioLevelMonitor::new(
            source,
            MonitorConfig::new().with_frame_interval(Duration::from_millis(5)),
        )
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_safe_before_start() {
        let source = ScriptedSource::tone();
        let mut monitor = monitor(source.clone());

        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.level(), 0.0);
        assert!(!monitor.is_tested());
        assert_eq!(source.stopped.load(Ordering::SeqCst), 0);

        monitor.start().await.unwrap();
        monitor.stop();
        monitor.stop();
        assert_eq!(source.stopped.load(Ordering::SeqCst), 1);
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn level_rises_while_running_and_zeroes_on_stop() {
        let source = ScriptedSource::tone();
        let mut monitor = monitor(source.clone());
        let mut levels = monitor.subscribe();

        monitor.start().await.unwrap();
        assert!(monitor.is_tested());

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                levels.changed().await.unwrap();
                if *levels.borrow() > 0.0 {
                    break;
                }
            }
        })
        .await
        .expect("level never rose");
        assert!(monitor.level() <= 100.0);

        monitor.stop();
        assert_eq!(monitor.level(), 0.0);

        // Nothing is published after stop
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(monitor.level(), 0.0);
    }

    #[tokio::test]
    async fn start_while_running_does_not_reopen() {
        let source = ScriptedSource::tone();
        let mut monitor = monitor(source.clone());

        monitor.start().await.unwrap();
        monitor.start().await.unwrap();
        assert_eq!(source.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capture_failures_leave_monitor_idle() {
        for err in [
            ProbeError::PermissionDenied,
            ProbeError::DeviceNotFound,
            ProbeError::Capture("busy".to_string()),
        ] {
            let mut monitor = monitor(ScriptedSource::failing(err.clone()));
            assert_eq!(monitor.start().await, Err(err));
            assert!(!monitor.is_tested());
            assert!(!monitor.is_running());
            assert_eq!(monitor.level(), 0.0);
            monitor.stop();
        }
    }

    #[tokio::test]
    async fn drop_releases_capture() {
        let source = ScriptedSource::tone();
        {
            let mut monitor = monitor(source.clone());
            monitor.start().await.unwrap();
        }
        assert_eq!(source.stopped.load(Ordering::SeqCst), 1);
    }
}
