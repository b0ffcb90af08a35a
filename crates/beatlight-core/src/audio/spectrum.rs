//! Spectral feature extraction
//!
//! Runs a forward FFT over each channel of an [`AnalysisFrame`] and keeps
//! the magnitudes of the `N/2 + 1` non-negative frequency bins. How the
//! magnitudes are scaled is a per-backend [`Normalization`] policy.

use super::pacer::AnalysisFrame;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Magnitude scaling applied after the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// `|X| / (N * i16::MAX)`, cube-root compressed and smoothstepped into `[0, 1]`
    Perceptual,
    /// `|X| / (N / 2)`
    HalfLength,
    /// `|X| / N`
    Length,
}

impl Normalization {
    fn apply(self, magnitude: f32, n: usize) -> f32 {
        match self {
            Self::Perceptual => {
                let x = magnitude / (n as f32 * f32::from(i16::MAX));
                let x = 2.0 * x.cbrt();
                smoothstep(0.0, 1.0, x * 1.5 - 0.5)
            }
            Self::HalfLength => magnitude / (n / 2) as f32,
            Self::Length => magnitude / n as f32,
        }
    }
}

/// Hermite interpolation between `edge0` and `edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Per-channel magnitude spectra of one analysis frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumFrame {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl SpectrumFrame {
    /// Number of bins per channel.
    pub fn bins(&self) -> usize {
        self.left.len()
    }
}

/// Mean and standard deviation of spectral energy in a low sub-band.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExcitationSignal {
    pub mean: f32,
    pub std_dev: f32,
}

impl ExcitationSignal {
    /// Two-pass statistics over the combined `left + right` magnitudes of
    /// bins `0..band_len`, both divided by `scale`.
    pub fn from_spectrum(spectrum: &SpectrumFrame, band_len: usize, scale: f32) -> Self {
        let band_len = band_len.min(spectrum.bins());
        if band_len == 0 || scale <= 0.0 {
            return Self::default();
        }

        let combined = spectrum.left[..band_len]
            .iter()
            .zip(&spectrum.right[..band_len])
            .map(|(l, r)| l + r);

        let mean = combined.clone().sum::<f32>() / band_len as f32;
        let variance = combined.map(|x| (x - mean) * (x - mean)).sum::<f32>() / band_len as f32;

        Self {
            mean: (mean / scale).max(0.0),
            std_dev: (variance.max(0.0).sqrt() / scale).max(0.0),
        }
    }
}

/// Forward-transform stage shared by all backends
pub struct SpectralExtractor {
    fft: Arc<dyn Fft<f32>>,
    frame_size: usize,
    normalization: Normalization,
    fft_buffer: Vec<Complex<f32>>,
    scratch_buffer: Vec<Complex<f32>>,
    spectrum: SpectrumFrame,
}

impl SpectralExtractor {
    pub fn new(frame_size: usize, normalization: Normalization) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(frame_size);
        let scratch_len = fft.get_inplace_scratch_len();
        let bins = frame_size / 2 + 1;

        debug!(
            "SpectralExtractor created: frame_size={}, bins={}, normalization={:?}",
            frame_size, bins, normalization
        );

        Self {
            fft,
            frame_size,
            normalization,
            fft_buffer: vec![Complex::new(0.0, 0.0); frame_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            spectrum: SpectrumFrame {
                left: vec![0.0; bins],
                right: vec![0.0; bins],
            },
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Transform both channels of `frame`. The returned spectrum is reused
    /// by the next call.
    pub fn process(&mut self, frame: &AnalysisFrame) -> &SpectrumFrame {
        debug_assert_eq!(frame.frame_size(), self.frame_size);

        self.transform(frame.left());
        Self::store_magnitudes(
            &self.fft_buffer,
            &mut self.spectrum.left,
            self.normalization,
            self.frame_size,
        );

        self.transform(frame.right());
        Self::store_magnitudes(
            &self.fft_buffer,
            &mut self.spectrum.right,
            self.normalization,
            self.frame_size,
        );

        &self.spectrum
    }

    /// Latest spectrum without recomputing.
    pub fn spectrum(&self) -> &SpectrumFrame {
        &self.spectrum
    }

    fn transform(&mut self, channel: impl Iterator<Item = i16>) {
        for (slot, sample) in self.fft_buffer.iter_mut().zip(channel) {
            *slot = Complex::new(f32::from(sample), 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);
    }

    fn store_magnitudes(
        fft_buffer: &[Complex<f32>],
        out: &mut [f32],
        normalization: Normalization,
        n: usize,
    ) {
        for (bin, value) in out.iter_mut().enumerate() {
            *value = normalization.apply(fft_buffer[bin].norm(), n).max(0.0);
        }
    }
}
