// Microphone self-test: capture, spectrum analysis, level monitor

pub mod analyser;
pub mod capture;
pub mod monitor;

pub use analyser::{normalized_level, FrequencyAnalyser};
pub use capture::{default_capture_source, CaptureSource, CaptureStream, SampleWindow};
pub use monitor::AudioLevelMonitor;

use std::time::Duration;

use thiserror::Error;

/// Transform size of the level analyser
pub const FFT_SIZE: usize = 256;

/// Average byte magnitude that maps to a level of 100
pub const REFERENCE_MAGNITUDE: f32 = 128.0;

/// Failures opening the microphone. They never touch call state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProbeError {
    #[error("Microphone access denied. Please allow microphone access in your system settings.")]
    PermissionDenied,

    #[error("No microphone found. Please connect a microphone.")]
    DeviceNotFound,

    #[error("Microphone error: {0}")]
    Capture(String),
}

/// Processing requested from the capture backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Audio configuration for the microphone probe
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub constraints: CaptureConstraints,
    /// Samples per analysis frame
    pub fft_size: usize,
    /// How often the level is resampled (one display frame)
    pub frame_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            constraints: CaptureConstraints::default(),
            fft_size: FFT_SIZE,
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}
