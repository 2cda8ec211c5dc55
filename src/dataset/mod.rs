//! Dataset indexing
//!
//! Manifest-backed list of audio records with an optional length ordering
//! used to keep similarly sized samples in the same batch.

pub mod index;

pub use index::{AudioIndex, AudioRecord, Batches};
