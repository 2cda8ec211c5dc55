//! Feature extraction modules
//!
//! This module contains the spectral feature pipeline:
//! - STFT power spectrogram
//! - Mel filterbank
//! - MFCC (log-mel + DCT)
//! - Delta features
//! - Stacked MFCC/delta/delta-delta extraction

pub mod deltas;
pub mod extractor;
pub mod mel;
pub mod mfcc;
pub mod stft;

pub use extractor::FeatureExtractor;
