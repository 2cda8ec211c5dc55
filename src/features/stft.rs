//! Short-time Fourier transform
//!
//! Centered power spectrogram:
//! 1. Reflect-pad the signal by `n_fft / 2` samples on both sides
//! 2. Slice frames of `n_fft` samples every `hop_length` samples
//! 3. Apply a periodic Hann window
//! 4. FFT and keep `|X|²` for the `n_fft / 2 + 1` non-negative bins
//!
//! With centering the frame count is `1 + len / hop_length`, so two signals
//! of different lengths always map to a predictable number of frames.

use std::sync::Arc;

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{PipelineError, Result};

/// Reusable STFT plan
///
/// Immutable after construction, so one instance can be shared between
/// threads.
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .finish()
    }
}

impl Stft {
    /// Plan an STFT with a periodic Hann window of `n_fft` samples
    pub fn new(n_fft: usize, hop_length: usize) -> Result<Self> {
        if n_fft < 2 {
            return Err(PipelineError::InvalidInput(format!(
                "FFT size must be >= 2, got {}",
                n_fft
            )));
        }
        if hop_length == 0 {
            return Err(PipelineError::InvalidInput(
                "Hop length must be > 0".to_string(),
            ));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);

        Ok(Self {
            n_fft,
            hop_length,
            window: hann_window(n_fft),
            fft,
        })
    }

    /// Number of non-negative frequency bins
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        let pad = self.n_fft / 2;
        1 + (len + 2 * pad - self.n_fft) / self.hop_length
    }

    /// Power spectrogram of shape `(n_freqs, frames)`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty signal
    pub fn power_spectrogram(&self, samples: &[f32]) -> Result<Array2<f32>> {
        if samples.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Cannot compute STFT of an empty signal".to_string(),
            ));
        }

        let pad = self.n_fft / 2;
        let n_frames = self.num_frames(samples.len());
        let n_freqs = self.n_freqs();

        let mut spec = Array2::<f32>::zeros((n_freqs, n_frames));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for frame in 0..n_frames {
            let start = frame * self.hop_length;
            for (n, (slot, &w)) in buffer.iter_mut().zip(&self.window).enumerate() {
                let idx = reflect_index(start as isize + n as isize - pad as isize, samples.len());
                *slot = Complex::new(samples[idx] * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (k, bin) in buffer.iter().take(n_freqs).enumerate() {
                spec[[k, frame]] = bin.norm_sqr();
            }
        }

        Ok(spec)
    }
}

/// Periodic Hann window: `0.5 * (1 - cos(2πn / N))`
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| {
            let angle = 2.0 * std::f32::consts::PI * n as f32 / size as f32;
            0.5 * (1.0 - angle.cos())
        })
        .collect()
}

/// Map a position outside `[0, len)` back into range by mirroring around the
/// end samples (edge samples are not repeated). Works for any `len >= 1`,
/// including signals shorter than the pad width.
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = i.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}
