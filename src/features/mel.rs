//! Mel filterbank and mel spectrogram
//!
//! Triangular filters on the HTK mel scale (`2595 * log10(1 + f / 700)`),
//! without area normalization. Filter edges are spaced evenly in mel between
//! `f_min` and `f_max`; FFT bin centres are spaced linearly over `[0, sr / 2]`.

use ndarray::Array2;

use crate::error::{PipelineError, Result};

#[inline]
fn hz_to_mel(freq: f32) -> f32 {
    2595.0 * (1.0 + freq / 700.0).log10()
}

#[inline]
fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Mel filterbank matrix of shape `(n_mels, n_freqs)`
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Array2<f32>,
}

impl MelFilterbank {
    /// Build a filterbank for `n_freqs` one-sided FFT bins
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the frequency range is empty or outside
    /// `[0, sample_rate / 2]`
    pub fn new(
        sample_rate: u32,
        n_freqs: usize,
        n_mels: usize,
        f_min: f32,
        f_max: f32,
    ) -> Result<Self> {
        let nyquist = sample_rate as f32 / 2.0;
        if n_freqs < 2 || n_mels == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "Filterbank needs >= 2 frequency bins and >= 1 band, got {} and {}",
                n_freqs, n_mels
            )));
        }
        if f_min < 0.0 || f_max <= f_min || f_max > nyquist {
            return Err(PipelineError::InvalidInput(format!(
                "Invalid filterbank range: f_min={}, f_max={}, nyquist={}",
                f_min, f_max, nyquist
            )));
        }

        let top = (sample_rate / 2) as f32;
        let fft_freqs: Vec<f32> = (0..n_freqs)
            .map(|k| top * k as f32 / (n_freqs - 1) as f32)
            .collect();

        let mel_min = hz_to_mel(f_min);
        let mel_max = hz_to_mel(f_max);
        let edges: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let mut filters = Array2::<f32>::zeros((n_mels, n_freqs));
        let mut empty_bands = 0;
        for m in 0..n_mels {
            let lower = edges[m + 1] - edges[m];
            let upper = edges[m + 2] - edges[m + 1];
            let mut row_sum = 0.0;
            for (k, &f) in fft_freqs.iter().enumerate() {
                let down = (f - edges[m]) / lower;
                let up = (edges[m + 2] - f) / upper;
                let weight = down.min(up).max(0.0);
                filters[[m, k]] = weight;
                row_sum += weight;
            }
            if row_sum == 0.0 {
                empty_bands += 1;
            }
        }

        if empty_bands > 0 {
            // Happens when n_mels is large relative to the FFT resolution
            log::warn!(
                "{} of {} mel bands cover no FFT bin (n_freqs={}, sample_rate={})",
                empty_bands,
                n_mels,
                n_freqs,
                sample_rate
            );
        }

        Ok(Self { filters })
    }

    /// Number of mel bands
    pub fn n_mels(&self) -> usize {
        self.filters.nrows()
    }

    /// Filter weights, one row per band
    pub fn filters(&self) -> &Array2<f32> {
        &self.filters
    }

    /// Project a power spectrogram `(n_freqs, frames)` to `(n_mels, frames)`
    pub fn apply(&self, power_spec: &Array2<f32>) -> Result<Array2<f32>> {
        if power_spec.nrows() != self.filters.ncols() {
            return Err(PipelineError::ProcessingError(format!(
                "Spectrogram has {} bins, filterbank expects {}",
                power_spec.nrows(),
                self.filters.ncols()
            )));
        }
        Ok(self.filters.dot(power_spec))
    }
}
