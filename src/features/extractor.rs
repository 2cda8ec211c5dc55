//! Stacked cepstral feature extraction
//!
//! Produces one `(3 * n_mfcc, frames)` matrix per sample:
//! MFCC rows first, then their deltas, then the delta-deltas.

use std::path::Path;

use ndarray::{concatenate, Array2, Axis};

use super::deltas::compute_deltas;
use super::mfcc::Mfcc;
use crate::config::FeatureConfig;
use crate::error::{PipelineError, Result};
use crate::io::decoder::{decode_audio, DecodedAudio};
use crate::preprocessing::channel_mixer::mix_to_mono;

/// MFCC + delta + delta-delta extractor
///
/// Holds only immutable, precomputed tables; every method takes `&self` and
/// may be called concurrently.
#[derive(Debug)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    mfcc: Mfcc,
}

impl FeatureExtractor {
    /// Build an extractor, validating `config`
    pub fn new(config: FeatureConfig) -> Result<Self> {
        let mfcc = Mfcc::new(&config)?;
        Ok(Self { config, mfcc })
    }

    /// Configuration in use
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Rows per feature matrix
    pub fn channels(&self) -> usize {
        self.config.feature_channels()
    }

    /// Frames produced for a mono signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        self.mfcc.num_frames(len)
    }

    /// Features of a mono signal
    pub fn extract_mono(&self, samples: &[f32]) -> Result<Array2<f32>> {
        let mfcc = self.mfcc.compute(samples)?;
        let deltas = compute_deltas(mfcc.view(), self.config.delta_win_length)?;
        let ddeltas = compute_deltas(deltas.view(), self.config.delta_win_length)?;

        let features = concatenate(Axis(0), &[mfcc.view(), deltas.view(), ddeltas.view()])?;
        Ok(features)
    }

    /// Features of decoded audio read from `path`
    ///
    /// # Errors
    ///
    /// Returns `SampleRateMismatch` if the audio does not use the configured
    /// rate and `DecodeError` if it contains no samples
    pub fn extract_decoded(&self, path: &Path, audio: &DecodedAudio) -> Result<Array2<f32>> {
        if audio.sample_rate != self.config.sample_rate {
            return Err(PipelineError::SampleRateMismatch {
                path: path.to_path_buf(),
                expected: self.config.sample_rate,
                found: audio.sample_rate,
            });
        }
        if audio.frames() == 0 {
            return Err(PipelineError::decode(path, "file contains no audio samples"));
        }

        let mono = mix_to_mono(&audio.samples, audio.channels, self.config.channel_mix)?;
        let features = self.extract_mono(&mono)?;

        log::debug!(
            "Extracted {}x{} features from {}",
            features.nrows(),
            features.ncols(),
            path.display()
        );
        Ok(features)
    }

    /// Decode `path` and extract its features
    pub fn extract_file(&self, path: &Path) -> Result<Array2<f32>> {
        let audio = decode_audio(path)?;
        self.extract_decoded(path, &audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chirp(sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.4 * (2.0 * std::f32::consts::PI * (200.0 + 800.0 * t) * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_stacked_layout() {
        let extractor = FeatureExtractor::new(FeatureConfig::new(16000)).unwrap();
        let samples = chirp(16000, 12000);
        let features = extractor.extract_mono(&samples).unwrap();
        assert_eq!(features.dim(), (39, 61));
        assert_eq!(extractor.num_frames(samples.len()), 61);

        // First block is the plain MFCC
        let mfcc = Mfcc::new(extractor.config()).unwrap().compute(&samples).unwrap();
        assert_eq!(features.slice(ndarray::s![0..13, ..]), mfcc);

        // Second block is its delta
        let deltas = compute_deltas(mfcc.view(), 5).unwrap();
        assert_eq!(features.slice(ndarray::s![13..26, ..]), deltas);
    }

    #[test]
    fn test_sample_rate_mismatch() {
        let extractor = FeatureExtractor::new(FeatureConfig::new(16000)).unwrap();
        let audio = DecodedAudio {
            samples: vec![0.0; 4410],
            sample_rate: 44100,
            channels: 1,
        };
        let err = extractor
            .extract_decoded(Path::new("clip.wav"), &audio)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SampleRateMismatch {
                expected: 16000,
                found: 44100,
                ..
            }
        ));
    }

    #[test]
    fn test_stereo_is_mixed_before_extraction() {
        let extractor = FeatureExtractor::new(FeatureConfig::new(8000)).unwrap();
        let mono = chirp(8000, 4000);
        let stereo: Vec<f32> = mono.iter().flat_map(|&s| [s, s]).collect();
        let audio = DecodedAudio {
            samples: stereo,
            sample_rate: 8000,
            channels: 2,
        };
        let from_stereo = extractor.extract_decoded(Path::new("s.wav"), &audio).unwrap();
        let from_mono = extractor.extract_mono(&mono).unwrap();
        assert_eq!(from_stereo, from_mono);
    }

    #[test]
    fn test_empty_audio_is_decode_error() {
        let extractor = FeatureExtractor::new(FeatureConfig::new(16000)).unwrap();
        let audio = DecodedAudio {
            samples: vec![],
            sample_rate: 16000,
            channels: 1,
        };
        assert!(matches!(
            extractor.extract_decoded(Path::new("empty.wav"), &audio),
            Err(PipelineError::DecodeError { .. })
        ));
    }
}
