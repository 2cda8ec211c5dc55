//! Variable-length batch collation
//!
//! Turns a list of audio paths into one dense tensor:
//!
//! 1. Decode every path
//! 2. Extract MFCC + delta + delta-delta features per sample
//! 3. Take the longest feature matrix as the padding target
//! 4. Zero-pad every sample on the trailing time axis
//! 5. Stack along a new leading batch axis
//!
//! Features are computed once per sample; the padding target comes from the
//! feature matrices themselves, so no separate sizing pass is needed.
//!
//! # Example
//!
//! ```no_run
//! use vae_audio_data::{Collator, FeatureConfig};
//!
//! let collator = Collator::new(FeatureConfig::new(16000))?;
//! let batch = collator.collate(&["clips/a.wav", "clips/b.wav"])?;
//! assert_eq!(batch.batch_size(), 2);
//! # Ok::<(), vae_audio_data::PipelineError>(())
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayView2, Axis};

use super::padding::pad_and_stack;
use crate::config::FeatureConfig;
use crate::error::{PipelineError, Result};
use crate::features::extractor::FeatureExtractor;

/// Dense batch of padded feature matrices
#[derive(Clone)]
pub struct PaddedBatch {
    /// Features of shape `(batch, 3 * n_mfcc, max_frames)`
    pub features: Array3<f32>,
    /// True frame count of each sample before padding
    pub lengths: Vec<usize>,
    /// Source file of each sample
    pub paths: Vec<PathBuf>,
}

impl PaddedBatch {
    /// Number of samples
    pub fn batch_size(&self) -> usize {
        self.features.len_of(Axis(0))
    }

    /// Feature rows per sample
    pub fn channels(&self) -> usize {
        self.features.len_of(Axis(1))
    }

    /// Padded time dimension
    pub fn max_frames(&self) -> usize {
        self.features.len_of(Axis(2))
    }

    /// Feature matrix of sample `i`, including padding
    pub fn sample(&self, i: usize) -> Option<ArrayView2<'_, f32>> {
        (i < self.batch_size()).then(|| self.features.index_axis(Axis(0), i))
    }

    /// Share of the tensor that is padding, in [0.0, 1.0]
    pub fn padding_ratio(&self) -> f32 {
        let total = self.batch_size() * self.max_frames();
        if total == 0 {
            return 0.0;
        }
        let used: usize = self.lengths.iter().sum();
        1.0 - used as f32 / total as f32
    }
}

impl fmt::Debug for PaddedBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "PaddedBatch with batch_size: {}, channels: {}, max_frames: {}, lengths: {:?}",
            self.batch_size(),
            self.channels(),
            self.max_frames(),
            self.lengths
        ))
    }
}

/// Stateless batch collator
///
/// `collate` takes `&self` and keeps nothing between calls, so a single
/// collator can serve several loader threads.
#[derive(Debug)]
pub struct Collator {
    extractor: FeatureExtractor,
}

impl Collator {
    /// Create a collator, validating `config`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the configuration is inconsistent
    pub fn new(config: FeatureConfig) -> Result<Self> {
        Ok(Self {
            extractor: FeatureExtractor::new(config)?,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &FeatureConfig {
        self.extractor.config()
    }

    /// Features of a single file, unpadded
    pub fn extract(&self, path: impl AsRef<Path>) -> Result<Array2<f32>> {
        self.extractor.extract_file(path.as_ref())
    }

    /// Collate `paths` into one padded batch
    ///
    /// # Errors
    ///
    /// Any decode or transform failure aborts the whole batch:
    /// - `InvalidInput` if `paths` is empty
    /// - `DecodeError` if a file is missing or corrupt
    /// - `SampleRateMismatch` if a file does not use the configured rate
    pub fn collate<P: AsRef<Path>>(&self, paths: &[P]) -> Result<PaddedBatch> {
        if paths.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Cannot collate an empty batch".to_string(),
            ));
        }

        let features = paths
            .iter()
            .map(|p| self.extract(p))
            .collect::<Result<Vec<_>>>()?;

        self.assemble(paths, &features)
    }

    /// Same as [`Collator::collate`], extracting samples on the rayon pool
    ///
    /// Output order matches `paths`. When several files fail, the returned
    /// error may belong to any of them, not necessarily the earliest.
    #[cfg(feature = "parallel")]
    pub fn collate_par<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Result<PaddedBatch> {
        use rayon::prelude::*;

        if paths.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Cannot collate an empty batch".to_string(),
            ));
        }

        let features = paths
            .par_iter()
            .map(|p| self.extract(p))
            .collect::<Result<Vec<_>>>()?;

        self.assemble(paths, &features)
    }

    fn assemble<P: AsRef<Path>>(
        &self,
        paths: &[P],
        features: &[Array2<f32>],
    ) -> Result<PaddedBatch> {
        let (features, lengths) = pad_and_stack(features)?;
        let batch = PaddedBatch {
            features,
            lengths,
            paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        };
        log::debug!("Collated {:?}", batch);
        Ok(batch)
    }
}
