use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::REFERENCE_MAGNITUDE;

const SMOOTHING_TIME_CONSTANT: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

/// Byte-scaled magnitude spectrum of the most recent sample window,
/// with Blackman windowing and exponential smoothing between frames.
pub struct FrequencyAnalyser {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    buffer: Vec<Complex<f32>>,
}

impl FrequencyAnalyser {
    pub fn new(fft_size: usize) -> Self {
        let fft_size = fft_size.max(2);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        Self {
            fft,
            window: blackman(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Analyse `samples` (the last `fft_size` samples, zero padded if short)
    /// and write one byte per frequency bin into `out`.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut [u8]) {
        let n = self.fft_size();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let range = MAX_DECIBELS - MIN_DECIBELS;
        for (k, smoothed) in self.smoothed.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() / n as f32;
            *smoothed = SMOOTHING_TIME_CONSTANT * *smoothed + (1.0 - SMOOTHING_TIME_CONSTANT) * magnitude;

            if let Some(byte) = out.get_mut(k) {
                *byte = if *smoothed > 0.0 {
                    let db = 20.0 * smoothed.log10();
                    (((db - MIN_DECIBELS) / range) * 255.0).clamp(0.0, 255.0) as u8
                } else {
                    0
                };
            }
        }
    }

    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|v| *v = 0.0);
    }
}

fn blackman(n: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42, 0.5, 0.08);
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

/// Average bin magnitude scaled to 0..=100
pub fn normalized_level(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    let average = sum as f32 / bins.len() as f32;
    ((average / REFERENCE_MAGNITUDE) * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::FFT_SIZE;

    fn tone(bin: usize, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn level_normalisation() {
        assert_eq!(normalized_level(&[]), 0.0);
        assert_eq!(normalized_level(&[0; 128]), 0.0);
        assert_eq!(normalized_level(&[64; 128]), 50.0);
        assert_eq!(normalized_level(&[128; 128]), 100.0);
        // Capped
        assert_eq!(normalized_level(&[255; 128]), 100.0);
    }

    #[test]
    fn silence_reads_zero() {
        let mut analyser = FrequencyAnalyser::new(FFT_SIZE);
        let mut bins = vec![0u8; analyser.frequency_bin_count()];
        analyser.byte_frequency_data(&vec![0.0; FFT_SIZE], &mut bins);
        assert!(bins.iter().all(|&b| b == 0));
        assert_eq!(normalized_level(&bins), 0.0);
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let mut analyser = FrequencyAnalyser::new(FFT_SIZE);
        assert_eq!(analyser.frequency_bin_count(), 128);

        let mut bins = vec![0u8; analyser.frequency_bin_count()];
        let samples = tone(16, 0.05);
        for _ in 0..10 {
            analyser.byte_frequency_data(&samples, &mut bins);
        }

        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 16);
        assert!(normalized_level(&bins) > 0.0);
    }

    #[test]
    fn smoothing_decays_after_sound_stops() {
        let mut analyser = FrequencyAnalyser::new(FFT_SIZE);
        let mut bins = vec![0u8; analyser.frequency_bin_count()];

        for _ in 0..10 {
            analyser.byte_frequency_data(&tone(16, 0.05), &mut bins);
        }
        let loud = bins[16];

        analyser.byte_frequency_data(&vec![0.0; FFT_SIZE], &mut bins);
        assert!(bins[16] < loud);
        assert!(bins[16] > 0);

        analyser.reset();
        analyser.byte_frequency_data(&vec![0.0; FFT_SIZE], &mut bins);
        assert_eq!(bins[16], 0);
    }
}
