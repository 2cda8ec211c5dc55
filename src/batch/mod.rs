//! Batch assembly
//!
//! Padding of variable-length feature matrices and the path-to-tensor
//! collator built on top of it.

pub mod collator;
pub mod padding;

pub use collator::{Collator, PaddedBatch};
