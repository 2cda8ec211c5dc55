//! Audio preprocessing modules
//!
//! Utilities for preparing decoded audio for feature extraction:
//! - Channel mixing (multi-channel to mono)

pub mod channel_mixer;
