//! Audio I/O modules
//!
//! Manifest reading with `csv` and audio decoding using Symphonia.

pub mod decoder;
pub mod manifest;

pub use decoder::{decode_audio, DecodedAudio};
pub use manifest::read_manifest;
