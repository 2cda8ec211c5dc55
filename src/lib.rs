//! # VAE Audio Data
//!
//! Data pipeline for training audio VAEs on variable-length clips: a
//! manifest-backed index that can be ordered by clip length, and a collator
//! that turns a list of clips into one zero-padded MFCC tensor.
//!
//! ## Features
//!
//! - **Audio Index**: tab-separated manifest (`path` column) resolved against
//!   a base directory, with an explicit, idempotent length sort
//! - **Feature Extraction**: MFCC with first and second order deltas,
//!   stacked into a `(3 * n_mfcc, frames)` matrix per clip
//! - **Collation**: per-batch zero padding on the time axis and stacking into
//!   a `(batch, channels, max_frames)` tensor
//!
//! ## Quick Start
//!
//! ```no_run
//! use vae_audio_data::{AudioIndex, Collator, FeatureConfig};
//!
//! let mut index = AudioIndex::from_manifest("cv/train.tsv", "cv/clips")?;
//! index.sort_by_length()?;
//!
//! let collator = Collator::new(FeatureConfig::new(16000))?;
//! for paths in index.batches(32)? {
//!     let batch = collator.collate(&paths)?;
//!     println!("{:?}", batch.features.shape());
//! }
//! # Ok::<(), vae_audio_data::PipelineError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Manifest → AudioIndex (optional length sort) → path batches
//!          → Collator: decode → mono → MFCC/Δ/ΔΔ → pad → stack → PaddedBatch
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod io;
pub mod preprocessing;

use std::path::Path;

// Re-export main types
pub use batch::{Collator, PaddedBatch};
pub use config::{FeatureConfig, SortConfig, SortPolicy};
pub use dataset::{AudioIndex, AudioRecord};
pub use error::{PipelineError, Result};
pub use preprocessing::channel_mixer::ChannelMixMode;

/// Collate a batch of audio files with a one-off collator
///
/// Convenience wrapper around [`Collator::new`] and [`Collator::collate`].
/// Training loops that collate many batches should build one [`Collator`]
/// and reuse it, since construction precomputes the filterbank and FFT plan.
///
/// # Arguments
///
/// * `paths` - Audio files of one batch, in output order
/// * `config` - Feature extraction parameters
///
/// # Errors
///
/// Returns `PipelineError` if the configuration is invalid or any file fails
/// to decode; no partial batch is returned
pub fn collate<P: AsRef<Path>>(paths: &[P], config: &FeatureConfig) -> Result<PaddedBatch> {
    log::debug!("Collating {} files at {} Hz", paths.len(), config.sample_rate);
    Collator::new(config.clone())?.collate(paths)
}
