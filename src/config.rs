//! Configuration parameters for feature extraction and dataset sorting

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::preprocessing::channel_mixer::ChannelMixMode;

/// Feature extraction configuration
///
/// There is deliberately no `Default` impl: the sample rate drives the mel
/// filterbank and must match the dataset, so callers always supply it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Expected sample rate of every decoded file in Hz (required)
    pub sample_rate: u32,

    /// Number of cepstral coefficients (default: 13)
    #[serde(default = "defaults::n_mfcc")]
    pub n_mfcc: usize,

    // STFT parameters
    /// FFT size and window length (default: 400)
    #[serde(default = "defaults::n_fft")]
    pub n_fft: usize,

    /// Hop size between frames (default: 200)
    #[serde(default = "defaults::hop_length")]
    pub hop_length: usize,

    // Mel filterbank
    /// Number of mel bands (default: 128)
    #[serde(default = "defaults::n_mels")]
    pub n_mels: usize,

    /// Lowest filterbank frequency in Hz (default: 0.0)
    #[serde(default)]
    pub f_min: f32,

    /// Highest filterbank frequency in Hz (default: Nyquist)
    #[serde(default)]
    pub f_max: Option<f32>,

    /// Use natural-log mel energies instead of decibels (default: true)
    #[serde(default = "defaults::log_mels")]
    pub log_mels: bool,

    /// Dynamic range kept when `log_mels` is false (default: 80.0 dB)
    #[serde(default = "defaults::top_db")]
    pub top_db: f32,

    /// Regression window for delta features, odd and >= 3 (default: 5)
    #[serde(default = "defaults::delta_win_length")]
    pub delta_win_length: usize,

    /// How multi-channel files are mixed to mono (default: Average)
    #[serde(default)]
    pub channel_mix: ChannelMixMode,
}

mod defaults {
    pub fn n_mfcc() -> usize {
        13
    }
    pub fn n_fft() -> usize {
        400
    }
    pub fn hop_length() -> usize {
        200
    }
    pub fn n_mels() -> usize {
        128
    }
    pub fn log_mels() -> bool {
        true
    }
    pub fn top_db() -> f32 {
        80.0
    }
    pub fn delta_win_length() -> usize {
        5
    }
}

impl FeatureConfig {
    /// Configuration with default MFCC parameters for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            n_mfcc: defaults::n_mfcc(),
            n_fft: defaults::n_fft(),
            hop_length: defaults::hop_length(),
            n_mels: defaults::n_mels(),
            f_min: 0.0,
            f_max: None,
            log_mels: defaults::log_mels(),
            top_db: defaults::top_db(),
            delta_win_length: defaults::delta_win_length(),
            channel_mix: ChannelMixMode::default(),
        }
    }

    /// Number of feature rows produced per sample (MFCC + delta + delta-delta)
    pub fn feature_channels(&self) -> usize {
        self.n_mfcc * 3
    }

    /// Upper filterbank edge, resolved against Nyquist
    pub fn resolved_f_max(&self) -> f32 {
        self.f_max.unwrap_or(self.sample_rate as f32 / 2.0)
    }

    /// Check parameter consistency
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PipelineError::InvalidInput(
                "Sample rate must be > 0".to_string(),
            ));
        }
        if self.n_fft < 2 {
            return Err(PipelineError::InvalidInput(format!(
                "FFT size must be >= 2, got {}",
                self.n_fft
            )));
        }
        if self.hop_length == 0 {
            return Err(PipelineError::InvalidInput(
                "Hop length must be > 0".to_string(),
            ));
        }
        if self.n_mels == 0 {
            return Err(PipelineError::InvalidInput(
                "Number of mel bands must be > 0".to_string(),
            ));
        }
        if self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return Err(PipelineError::InvalidInput(format!(
                "n_mfcc must be in [1, n_mels={}], got {}",
                self.n_mels, self.n_mfcc
            )));
        }
        let f_max = self.resolved_f_max();
        if self.f_min < 0.0 || f_max <= self.f_min || f_max > self.sample_rate as f32 / 2.0 {
            return Err(PipelineError::InvalidInput(format!(
                "Invalid filterbank range: f_min={}, f_max={} (Nyquist {})",
                self.f_min,
                f_max,
                self.sample_rate as f32 / 2.0
            )));
        }
        if self.delta_win_length < 3 || self.delta_win_length % 2 == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "Delta window must be odd and >= 3, got {}",
                self.delta_win_length
            )));
        }
        Ok(())
    }
}

/// What `sort_by_length` does when a record cannot be decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortPolicy {
    /// Abort the sort on the first failure, leaving the previous order intact
    #[default]
    FailFast,
    /// Log and move undecodable records after all decoded ones
    SkipFailed,
}

/// Dataset sorting configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Failure policy (default: FailFast)
    #[serde(default)]
    pub policy: SortPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_mfcc_defaults() {
        let config = FeatureConfig::new(16000);
        assert_eq!(config.n_mfcc, 13);
        assert_eq!(config.n_fft, 400);
        assert_eq!(config.hop_length, 200);
        assert_eq!(config.n_mels, 128);
        assert_eq!(config.feature_channels(), 39);
        assert_eq!(config.resolved_f_max(), 8000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut config = FeatureConfig::new(0);
        assert!(config.validate().is_err());

        config = FeatureConfig::new(16000);
        config.n_mfcc = 200;
        assert!(config.validate().is_err());

        config = FeatureConfig::new(16000);
        config.f_max = Some(12000.0);
        assert!(config.validate().is_err());

        config = FeatureConfig::new(16000);
        config.delta_win_length = 1;
        assert!(config.validate().is_err());

        config = FeatureConfig::new(16000);
        config.delta_win_length = 4;
        assert!(config.validate().is_err());

        config = FeatureConfig::new(16000);
        config.hop_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_requires_only_sample_rate() {
        let config: FeatureConfig = serde_json::from_str(r#"{"sample_rate": 22050}"#).unwrap();
        assert_eq!(config, FeatureConfig::new(22050));

        let missing: std::result::Result<FeatureConfig, _> = serde_json::from_str("{}");
        assert!(missing.is_err(), "sample_rate has no default");
    }

    #[test]
    fn test_sort_config_defaults_to_fail_fast() {
        assert_eq!(SortConfig::default().policy, SortPolicy::FailFast);
    }
}
