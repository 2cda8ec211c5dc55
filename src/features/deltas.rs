//! Delta (time-derivative) features
//!
//! Regression over a window of `2N + 1` frames:
//!
//! `d[t] = Σ_{k=1..N} k * (x[t + k] - x[t - k]) / (2 * Σ_{k=1..N} k²)`
//!
//! Frames beyond either edge replicate the edge frame, so the output has the
//! same number of frames as the input.

use ndarray::{Array2, ArrayView2};

use crate::error::{PipelineError, Result};

/// Delta features along the time (column) axis
///
/// # Arguments
///
/// * `features` - Feature matrix of shape `(channels, frames)`
/// * `win_length` - Regression window, odd and `>= 3`
///
/// # Returns
///
/// Matrix of the same shape as `features`
pub fn compute_deltas(features: ArrayView2<'_, f32>, win_length: usize) -> Result<Array2<f32>> {
    if win_length < 3 || win_length % 2 == 0 {
        return Err(PipelineError::InvalidInput(format!(
            "Delta window must be odd and >= 3, got {}",
            win_length
        )));
    }

    let n = (win_length - 1) / 2;
    let denom: f32 = 2.0 * (1..=n).map(|k| (k * k) as f32).sum::<f32>();

    let (channels, frames) = features.dim();
    let mut out = Array2::<f32>::zeros((channels, frames));
    if frames == 0 {
        return Ok(out);
    }

    let last = frames as isize - 1;
    let clamp = |t: isize| t.clamp(0, last) as usize;

    for (row_in, mut row_out) in features.rows().into_iter().zip(out.rows_mut()) {
        for t in 0..frames {
            let mut acc = 0.0f32;
            for k in 1..=n {
                let ahead = row_in[clamp(t as isize + k as isize)];
                let behind = row_in[clamp(t as isize - k as isize)];
                acc += k as f32 * (ahead - behind);
            }
            row_out[t] = acc / denom;
        }
    }

    Ok(out)
}
