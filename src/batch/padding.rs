//! Zero padding and stacking of variable-length feature matrices

use ndarray::{s, Array2, Array3};

use crate::error::{PipelineError, Result};

/// Stack `(channels, frames_i)` matrices into `(batch, channels, max_frames)`
///
/// Each matrix is copied to the front of its slot; the remaining trailing
/// frames stay exactly `0.0`. Nothing is ever truncated.
///
/// # Returns
///
/// The stacked tensor and the original frame count of every sample
///
/// # Errors
///
/// Returns `InvalidInput` for an empty batch and `ProcessingError` if the
/// channel counts disagree
pub fn pad_and_stack(features: &[Array2<f32>]) -> Result<(Array3<f32>, Vec<usize>)> {
    let first = features.first().ok_or_else(|| {
        PipelineError::InvalidInput("Cannot stack an empty batch".to_string())
    })?;
    let channels = first.nrows();

    if let Some(bad) = features.iter().find(|f| f.nrows() != channels) {
        return Err(PipelineError::ProcessingError(format!(
            "Feature channel mismatch in batch: expected {}, found {}",
            channels,
            bad.nrows()
        )));
    }

    let lengths: Vec<usize> = features.iter().map(|f| f.ncols()).collect();
    let max_frames = lengths.iter().copied().max().unwrap_or(0);

    log::debug!(
        "Padding {} samples to {} frames (shortest {})",
        features.len(),
        max_frames,
        lengths.iter().copied().min().unwrap_or(0)
    );

    let mut batch = Array3::<f32>::zeros((features.len(), channels, max_frames));
    for (i, feature) in features.iter().enumerate() {
        batch
            .slice_mut(s![i, .., ..feature.ncols()])
            .assign(feature);
    }

    Ok((batch, lengths))
}
