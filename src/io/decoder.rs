//! Audio decoding using Symphonia

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PipelineError, Result};

/// PCM samples of one decoded file
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: usize,
}

impl DecodedAudio {
    /// Number of samples per channel
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f32 / self.sample_rate as f32
        }
    }
}

/// Decode audio file to interleaved PCM samples
///
/// Every codec Symphonia is built with is accepted (WAV/PCM, FLAC, Ogg
/// Vorbis, MP3, ...). The first track with a known codec is decoded.
///
/// # Errors
///
/// Returns `DecodeError` naming `path` if the file cannot be opened, probed,
/// or a packet fails to decode. Corrupt packets are not skipped, and a stream
/// that ends before the frame count declared in its header is rejected.
pub fn decode_audio(path: &Path) -> Result<DecodedAudio> {
    log::debug!("Decoding audio file: {}", path.display());

    let src = File::open(path).map_err(|e| PipelineError::decode(path, e))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| PipelineError::decode(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PipelineError::decode(path, "no supported audio tracks found"))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let declared_frames = track.codec_params.n_frames;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PipelineError::decode(path, e))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                return Err(PipelineError::decode(path, "stream changed parameters mid-file"));
            }
            Err(e) => return Err(PipelineError::decode(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| PipelineError::decode(path, e))?;

        let spec = *decoded.spec();
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }
        if channels.is_none() {
            channels = Some(spec.channels.count());
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let sample_rate =
        sample_rate.ok_or_else(|| PipelineError::decode(path, "unknown sample rate"))?;
    let channels = match channels {
        Some(c) if c > 0 => c,
        _ => return Err(PipelineError::decode(path, "unknown channel layout")),
    };

    // End of stream and a cut-off data chunk both surface as UnexpectedEof
    if let Some(expected) = declared_frames {
        let decoded_frames = (samples.len() / channels) as u64;
        if decoded_frames < expected {
            return Err(PipelineError::decode(
                path,
                format!(
                    "stream truncated: decoded {} of {} frames",
                    decoded_frames, expected
                ),
            ));
        }
    }

    log::debug!(
        "Decoded {}: {} frames, {} channel(s) at {} Hz",
        path.display(),
        samples.len() / channels,
        channels,
        sample_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for ch in 0..channels {
                let v = ((i as f32 * 0.05).sin() * 0.5 * (ch as f32 + 1.0) * 16384.0) as i16;
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 16000, 1, 8000);

        let audio = decode_audio(&path).unwrap();
        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.frames(), 8000);
        assert!((audio.duration_seconds() - 0.5).abs() < 1e-6);
        assert!(audio.samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_decode_stereo_wav_is_interleaved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 8000, 2, 1000);

        let audio = decode_audio(&path).unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.samples.len(), 2000);
        assert_eq!(audio.frames(), 1000);
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let err = decode_audio(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(matches!(err, PipelineError::DecodeError { .. }));
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"this is definitely not audio data").unwrap();

        let err = decode_audio(&path).unwrap_err();
        match err {
            PipelineError::DecodeError { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected DecodeError, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.wav");
        write_wav(&path, 16000, 1, 16000);

        // Keep the header (which still declares 16000 frames) and cut the data
        // chunk after 40% of its 32000 bytes
        let mut bytes = std::fs::read(&path).unwrap();
        let data_len = 16000 * 2;
        let header_len = bytes.len() - data_len;
        bytes.truncate(header_len + data_len * 2 / 5);
        std::fs::write(&path, &bytes).unwrap();

        let err = decode_audio(&path).unwrap_err();
        match err {
            PipelineError::DecodeError { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("truncated"), "got: {}", reason);
            }
            other => panic!("expected DecodeError, got {:?}", other),
        }
    }
}
