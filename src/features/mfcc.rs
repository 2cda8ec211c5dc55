//! Mel-frequency cepstral coefficients
//!
//! Algorithm:
//! 1. Power spectrogram (centered STFT, Hann window)
//! 2. Mel filterbank projection
//! 3. Log compression: `ln(mel + 1e-6)`, or decibels clamped to `top_db`
//!    below the peak
//! 4. Orthonormal DCT-II over the mel axis, keeping the first `n_mfcc`
//!    coefficients

use ndarray::Array2;

use super::mel::MelFilterbank;
use super::stft::Stft;
use crate::config::FeatureConfig;
use crate::error::{PipelineError, Result};

/// Offset added before the natural log
const LOG_OFFSET: f32 = 1e-6;

/// Floor applied before the decibel conversion
const AMIN: f32 = 1e-10;

/// MFCC transform with precomputed STFT plan, filterbank and DCT basis
#[derive(Debug)]
pub struct Mfcc {
    stft: Stft,
    filterbank: MelFilterbank,
    dct: Array2<f32>,
    log_mels: bool,
    top_db: f32,
}

impl Mfcc {
    /// Build the transform from a validated configuration
    pub fn new(config: &FeatureConfig) -> Result<Self> {
        config.validate()?;

        let stft = Stft::new(config.n_fft, config.hop_length)?;
        let filterbank = MelFilterbank::new(
            config.sample_rate,
            stft.n_freqs(),
            config.n_mels,
            config.f_min,
            config.resolved_f_max(),
        )?;

        Ok(Self {
            stft,
            filterbank,
            dct: dct_ortho(config.n_mfcc, config.n_mels),
            log_mels: config.log_mels,
            top_db: config.top_db,
        })
    }

    /// Number of cepstral coefficients per frame
    pub fn n_mfcc(&self) -> usize {
        self.dct.nrows()
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        self.stft.num_frames(len)
    }

    /// Log-compressed mel spectrogram of shape `(n_mels, frames)`
    pub fn log_mel_spectrogram(&self, samples: &[f32]) -> Result<Array2<f32>> {
        let power = self.stft.power_spectrogram(samples)?;
        let mut mel = self.filterbank.apply(&power)?;

        if self.log_mels {
            mel.mapv_inplace(|v| (v + LOG_OFFSET).ln());
        } else {
            mel.mapv_inplace(|v| 10.0 * v.max(AMIN).log10());
            let peak = mel.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            let floor = peak - self.top_db;
            mel.mapv_inplace(|v| v.max(floor));
        }

        Ok(mel)
    }

    /// Cepstral coefficients of shape `(n_mfcc, frames)`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty signal and `ProcessingError` if a
    /// non-finite coefficient is produced
    pub fn compute(&self, samples: &[f32]) -> Result<Array2<f32>> {
        let log_mel = self.log_mel_spectrogram(samples)?;
        let mfcc = self.dct.dot(&log_mel);

        if mfcc.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::ProcessingError(
                "MFCC produced non-finite values (check input for NaN/inf)".to_string(),
            ));
        }

        Ok(mfcc)
    }
}

/// Orthonormal DCT-II basis of shape `(n_out, n_in)`
///
/// `D[k, n] = s(k) * cos(π / N * (n + 0.5) * k)` with `s(0) = sqrt(1 / N)`
/// and `s(k) = sqrt(2 / N)` otherwise.
pub fn dct_ortho(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f32;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        scale * (std::f32::consts::PI / n * (i as f32 + 0.5) * k as f32).cos()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: u32, seconds: f32) -> Vec<f32> {
        let n = (sample_rate as f32 * seconds) as usize;
        (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_dct_basis_is_orthonormal() {
        let d = dct_ortho(8, 8);
        let gram = d.dot(&d.t());
        for i in 0..8 {
            for j in 0..8 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (gram[[i, j]] - expected).abs() < 1e-5,
                    "gram[{},{}] = {}",
                    i,
                    j,
                    gram[[i, j]]
                );
            }
        }
    }

    #[test]
    fn test_output_shape() {
        let mfcc = Mfcc::new(&FeatureConfig::new(16000)).unwrap();
        let samples = tone(440.0, 16000, 1.0);
        let coeffs = mfcc.compute(&samples).unwrap();
        assert_eq!(coeffs.dim(), (13, 81));
        assert_eq!(mfcc.num_frames(samples.len()), 81);
    }

    #[test]
    fn test_silence_gives_constant_log_floor() {
        let mfcc = Mfcc::new(&FeatureConfig::new(16000)).unwrap();
        let coeffs = mfcc.compute(&vec![0.0f32; 4000]).unwrap();
        // ln(1e-6) in every band: only c0 is non-zero
        let expected_c0 = LOG_OFFSET.ln() * (128f32).sqrt();
        for t in 0..coeffs.ncols() {
            assert!((coeffs[[0, t]] - expected_c0).abs() < 1e-2);
            for k in 1..13 {
                assert!(coeffs[[k, t]].abs() < 1e-2);
            }
        }
    }

    #[test]
    fn test_decibel_mode_respects_top_db() {
        let mut config = FeatureConfig::new(16000);
        config.log_mels = false;
        config.top_db = 40.0;
        let mfcc = Mfcc::new(&config).unwrap();
        let log_mel = mfcc.log_mel_spectrogram(&tone(1000.0, 16000, 0.5)).unwrap();
        let peak = log_mel.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let low = log_mel.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!(peak - low <= 40.0 + 1e-3);
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mfcc = Mfcc::new(&FeatureConfig::new(16000)).unwrap();
        let mut samples = tone(440.0, 16000, 0.1);
        samples[100] = f32::NAN;
        assert!(matches!(
            mfcc.compute(&samples),
            Err(PipelineError::ProcessingError(_))
        ));
    }
}
