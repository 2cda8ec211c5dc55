//! Channel mixing utilities (multi-channel to mono conversion)

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Channel mixing mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMixMode {
    /// Simple average of all channels
    #[default]
    Average,
    /// Keep the first channel only
    First,
    /// Keep the channel with the highest RMS energy
    Dominant,
}

/// Mix interleaved samples down to a single channel
///
/// # Arguments
///
/// * `interleaved` - Samples ordered frame by frame (`[l0, r0, l1, r1, ...]`)
/// * `channels` - Number of interleaved channels
/// * `mode` - Mixing mode
///
/// # Returns
///
/// Mono samples, one per frame
///
/// # Errors
///
/// Returns `InvalidInput` if `channels` is 0 or the sample count is not a
/// multiple of `channels`
pub fn mix_to_mono(
    interleaved: &[f32],
    channels: usize,
    mode: ChannelMixMode,
) -> Result<Vec<f32>, PipelineError> {
    if channels == 0 {
        return Err(PipelineError::InvalidInput(
            "Channel count must be > 0".to_string(),
        ));
    }
    if interleaved.len() % channels != 0 {
        return Err(PipelineError::InvalidInput(format!(
            "{} samples cannot be split into {} channels",
            interleaved.len(),
            channels
        )));
    }
    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    log::debug!(
        "Mixing {} frames of {} channels to mono using {:?}",
        interleaved.len() / channels,
        channels,
        mode
    );

    let mono = match mode {
        ChannelMixMode::Average => interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect(),
        ChannelMixMode::First => extract_channel(interleaved, channels, 0),
        ChannelMixMode::Dominant => {
            let mut energy = vec![0.0f64; channels];
            for frame in interleaved.chunks_exact(channels) {
                for (acc, &s) in energy.iter_mut().zip(frame) {
                    *acc += (s as f64) * (s as f64);
                }
            }
            // Ties go to the lowest channel index
            let loudest = energy
                .iter()
                .enumerate()
                .fold(0, |best, (ch, &e)| if e > energy[best] { ch } else { best });
            extract_channel(interleaved, channels, loudest)
        }
    };

    Ok(mono)
}

fn extract_channel(interleaved: &[f32], channels: usize, channel: usize) -> Vec<f32> {
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame[channel])
        .collect()
}
