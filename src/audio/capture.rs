use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CaptureConstraints, ProbeError};

/// Rolling buffer of the most recent mono samples, shared between the
/// capture callback and the level sampler.
pub struct SampleWindow {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let mut window = self.samples.lock();
        for &sample in samples {
            if window.len() == self.capacity {
                window.pop_front();
            }
            window.push_back(sample);
        }
    }

    /// Down-mix interleaved frames to mono before buffering
    pub fn push_interleaved(&self, data: &[f32], channels: usize) {
        if channels <= 1 {
            self.push(data);
            return;
        }
        let mono: Vec<f32> = data
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();
        self.push(&mono);
    }

    /// Copy the newest samples into `out`, oldest first. Slots without a
    /// captured sample yet are zeroed.
    pub fn copy_latest(&self, out: &mut [f32]) {
        let window = self.samples.lock();
        let available = window.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].iter_mut().for_each(|s| *s = 0.0);
        for (slot, sample) in out[pad..]
            .iter_mut()
            .zip(window.iter().skip(window.len() - available))
        {
            *slot = *sample;
        }
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

/// An open microphone. Dropping or stopping it releases the device.
pub trait CaptureStream: Send {
    fn window(&self) -> Arc<SampleWindow>;

    /// Release the device. Safe to call more than once.
    fn stop(&mut self);
}

/// Opens microphone capture streams
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn open(
        &self,
        constraints: CaptureConstraints,
        window_len: usize,
    ) -> Result<Box<dyn CaptureStream>, ProbeError>;
}

/// Used when the crate is built without an audio backend
pub struct UnavailableCaptureSource;

#[async_trait]
impl CaptureSource for UnavailableCaptureSource {
    async fn open(
        &self,
        _constraints: CaptureConstraints,
        _window_len: usize,
    ) -> Result<Box<dyn CaptureStream>, ProbeError> {
        Err(ProbeError::DeviceNotFound)
    }
}

/// The capture backend compiled into this build
#[cfg(feature = "audio-cpal")]
pub fn default_capture_source() -> Arc<dyn CaptureSource> {
    Arc::new(cpal_backend::CpalCaptureSource::new())
}

#[cfg(not(feature = "audio-cpal"))]
pub fn default_capture_source() -> Arc<dyn CaptureSource> {
    Arc::new(UnavailableCaptureSource)
}

/// Map a backend failure message onto the probe's error kinds
pub(crate) fn classify_backend_error(message: &str) -> ProbeError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("not allowed") || lower.contains("denied") {
        ProbeError::PermissionDenied
    } else if lower.contains("not available") || lower.contains("no device") || lower.contains("not found") {
        ProbeError::DeviceNotFound
    } else {
        ProbeError::Capture(message.to_string())
    }
}

#[cfg(feature = "audio-cpal")]
pub use cpal_backend::CpalCaptureSource;

#[cfg(feature = "audio-cpal")]
mod cpal_backend {
    use std::sync::Arc;

    use async_trait::async_trait;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::SampleFormat;
    use log::{debug, error, info};
    use tokio::sync::oneshot;

    use super::{classify_backend_error, CaptureSource, CaptureStream, SampleWindow};
    use crate::audio::{CaptureConstraints, ProbeError};

    /// Default input device of the default cpal host
    pub struct CpalCaptureSource;

    impl CpalCaptureSource {
        pub fn new() -> Self {
            Self
        }
    }

    impl Default for CpalCaptureSource {
        fn default() -> Self {
            Self::new()
        }
    }

    struct CpalCaptureStream {
        window: Arc<SampleWindow>,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl CaptureStream for CpalCaptureStream {
        fn window(&self) -> Arc<SampleWindow> {
            self.window.clone()
        }

        fn stop(&mut self) {
            if let Some(shutdown) = self.shutdown.take() {
                debug!("Releasing microphone");
                let _ = shutdown.send(());
            }
        }
    }

    impl Drop for CpalCaptureStream {
        fn drop(&mut self) {
            self.stop();
        }
    }

    #[async_trait]
    impl CaptureSource for CpalCaptureSource {
        async fn open(
            &self,
            constraints: CaptureConstraints,
            window_len: usize,
        ) -> Result<Box<dyn CaptureStream>, ProbeError> {
            // cpal hands us raw input; processing flags are advisory only
            debug!("Opening microphone with {:?}", constraints);

            let window = Arc::new(SampleWindow::new(window_len));
            let (ready_tx, ready_rx) = oneshot::channel();
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

            // cpal streams are not Send, so a dedicated thread owns it
            let callback_window = window.clone();
            std::thread::spawn(move || {
                let stream = match build_stream(callback_window) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = ready_tx.send(Err(classify_backend_error(&e.to_string())));
                    return;
                }
                let _ = ready_tx.send(Ok(()));
                let _ = shutdown_rx.blocking_recv();
                drop(stream);
                debug!("Microphone stream closed");
            });

            match ready_rx.await {
                Ok(Ok(())) => {
                    info!("Microphone capture started");
                    Ok(Box::new(CpalCaptureStream {
                        window,
                        shutdown: Some(shutdown_tx),
                    }))
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ProbeError::Capture("capture thread exited".to_string())),
            }
        }
    }

    fn build_stream(window: Arc<SampleWindow>) -> Result<cpal::Stream, ProbeError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(ProbeError::DeviceNotFound)?;
        let supported = device.default_input_config().map_err(|e| match e {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => ProbeError::DeviceNotFound,
            other => classify_backend_error(&other.to_string()),
        })?;

        let channels = supported.channels() as usize;
        let config = supported.config();
        let on_error = |e: cpal::StreamError| error!("Microphone stream error: {}", e);

        let result = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    window.push_interleaved(data, channels)
                },
                on_error,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data.iter().map(|&s| s as f32 / 32768.0).collect();
                    window.push_interleaved(&samples, channels)
                },
                on_error,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let samples: Vec<f32> = data
                        .iter()
                        .map(|&s| (s as f32 - 32768.0) / 32768.0)
                        .collect();
                    window.push_interleaved(&samples, channels)
                },
                on_error,
                None,
            ),
            other => {
                return Err(ProbeError::Capture(format!("unsupported sample format {:?}", other)))
            }
        };

        result.map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => ProbeError::DeviceNotFound,
            other => classify_backend_error(&other.to_string()),
        })
    }
}
