//! Length-sortable audio index
//!
//! Records are held in manifest order. `sort_by_length` decodes every record
//! once and installs a second, derived ordering (ascending decoded sample
//! count). Lookups follow whichever ordering is current.
//!
//! # Example
//!
//! ```no_run
//! use vae_audio_data::AudioIndex;
//!
//! let mut index = AudioIndex::from_manifest("cv/train.tsv", "cv/clips")?;
//! index.sort_by_length()?;
//! for batch in index.batches(16)? {
//!     println!("{} files, shortest first", batch.len());
//! }
//! # Ok::<(), vae_audio_data::PipelineError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{SortConfig, SortPolicy};
use crate::error::{PipelineError, Result};
use crate::io::decoder::decode_audio;
use crate::io::manifest::read_manifest;

/// One audio sample, identified by its resolved path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AudioRecord {
    path: PathBuf,
}

impl AudioRecord {
    /// Create a record for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolved file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AsRef<Path> for AudioRecord {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Position in manifest order plus the decoded length, if known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SortedEntry {
    position: usize,
    sample_count: Option<usize>,
}

/// Ordered collection of audio records
#[derive(Debug, Clone)]
pub struct AudioIndex {
    records: Vec<AudioRecord>,
    length_order: Option<Vec<SortedEntry>>,
}

impl AudioIndex {
    /// Build an index from a tab-separated manifest with a `path` column
    ///
    /// # Errors
    ///
    /// Returns `ManifestError` if the manifest is missing, unreadable, or has
    /// no `path` column
    pub fn from_manifest(
        manifest_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let manifest_path = manifest_path.as_ref();
        let paths = read_manifest(manifest_path, base_dir.as_ref())?;
        log::info!(
            "Loaded {} records from {}",
            paths.len(),
            manifest_path.display()
        );
        Ok(Self::from_paths(paths))
    }

    /// Build an index from already-resolved paths
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            records: paths.into_iter().map(AudioRecord::new).collect(),
            length_order: None,
        }
    }

    /// Number of records (fixed at construction)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the manifest listed no files
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True once `sort_by_length` has completed
    pub fn is_sorted_by_length(&self) -> bool {
        self.length_order.is_some()
    }

    /// Record at `index` in the current order
    ///
    /// Manifest order before `sort_by_length`, length order after.
    ///
    /// # Errors
    ///
    /// Returns `IndexError` if `index >= len()`
    pub fn get(&self, index: usize) -> Result<&AudioRecord> {
        let position = self.position(index)?;
        Ok(&self.records[position])
    }

    /// Decoded sample count at `index` in length order
    ///
    /// `None` before sorting, for out-of-range indices, and for records that
    /// were skipped because they could not be decoded.
    pub fn sample_count(&self, index: usize) -> Option<usize> {
        self.length_order
            .as_ref()
            .and_then(|order| order.get(index))
            .and_then(|entry| entry.sample_count)
    }

    /// Records in the current order
    pub fn iter(&self) -> impl Iterator<Item = &AudioRecord> + '_ {
        (0..self.len()).map(move |i| &self.records[self.position_unchecked(i)])
    }

    /// Consecutive groups of `batch_size` paths in the current order
    ///
    /// The last group is shorter when `len()` is not a multiple of
    /// `batch_size`.
    pub fn batches(&self, batch_size: usize) -> Result<Batches<'_>> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidInput(
                "Batch size must be > 0".to_string(),
            ));
        }
        Ok(Batches {
            index: self,
            next: 0,
            batch_size,
        })
    }

    /// Reorder the index by decoded length, failing on the first bad file
    ///
    /// Equivalent to `sort_by_length_with(&SortConfig::default())`.
    pub fn sort_by_length(&mut self) -> Result<()> {
        self.sort_by_length_with(&SortConfig::default())
    }

    /// Decode every record and reorder ascending by sample count
    ///
    /// Lengths are recomputed on every call and the sort is stable (ties keep
    /// manifest order), so repeated calls yield the same order. The new order
    /// replaces the old one only once it is complete.
    ///
    /// # Errors
    ///
    /// With `SortPolicy::FailFast`, returns the first `DecodeError`; the
    /// current order is left unchanged. With the `parallel` feature records
    /// are decoded concurrently, so the returned error may belong to any
    /// failing record rather than the earliest one in manifest order.
    pub fn sort_by_length_with(&mut self, config: &SortConfig) -> Result<()> {
        let start = Instant::now();
        log::info!(
            "Sorting {} records by decoded length ({:?})",
            self.records.len(),
            config.policy
        );

        let lengths = self.measure_lengths(config.policy)?;

        let mut decoded = Vec::with_capacity(lengths.len());
        let mut skipped = Vec::new();
        for (position, length) in lengths.into_iter().enumerate() {
            match length {
                Some(count) => decoded.push(SortedEntry {
                    position,
                    sample_count: Some(count),
                }),
                None => skipped.push(SortedEntry {
                    position,
                    sample_count: None,
                }),
            }
        }

        decoded.sort_by_key(|entry| entry.sample_count);

        if !skipped.is_empty() {
            log::warn!(
                "{} of {} records could not be decoded and were moved to the end",
                skipped.len(),
                self.records.len()
            );
        }
        decoded.extend(skipped);

        self.length_order = Some(decoded);

        log::info!(
            "Sorted {} records in {:.2} s",
            self.records.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn measure_lengths(&self, policy: SortPolicy) -> Result<Vec<Option<usize>>> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                log::debug!(
                    "[{}/{}] Measuring {}",
                    i + 1,
                    self.records.len(),
                    record.path.display()
                );
                measure_one(record, policy)
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn measure_lengths(&self, policy: SortPolicy) -> Result<Vec<Option<usize>>> {
        use rayon::prelude::*;

        self.records
            .par_iter()
            .enumerate()
            .map(|(i, record)| {
                log::debug!(
                    "[{}/{}] Measuring {}",
                    i + 1,
                    self.records.len(),
                    record.path.display()
                );
                measure_one(record, policy)
            })
            .collect()
    }

    fn position(&self, index: usize) -> Result<usize> {
        if index >= self.records.len() {
            return Err(PipelineError::IndexError {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.position_unchecked(index))
    }

    fn position_unchecked(&self, index: usize) -> usize {
        match &self.length_order {
            Some(order) => order[index].position,
            None => index,
        }
    }
}

fn measure_one(record: &AudioRecord, policy: SortPolicy) -> Result<Option<usize>> {
    match decode_audio(record.path()) {
        Ok(audio) => Ok(Some(audio.frames())),
        Err(err) => match policy {
            SortPolicy::FailFast => Err(err),
            SortPolicy::SkipFailed => {
                log::warn!("Skipping undecodable record: {}", err);
                Ok(None)
            }
        },
    }
}

/// Iterator over path batches, created by [`AudioIndex::batches`]
#[derive(Debug)]
pub struct Batches<'a> {
    index: &'a AudioIndex,
    next: usize,
    batch_size: usize,
}

impl Iterator for Batches<'_> {
    type Item = Vec<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.index.len();
        if self.next >= len {
            return None;
        }
        let end = (self.next + self.batch_size).min(len);
        let batch = (self.next..end)
            .map(|i| {
                self.index.records[self.index.position_unchecked(i)]
                    .path
                    .clone()
            })
            .collect();
        self.next = end;
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.len().saturating_sub(self.next);
        let n = remaining.div_ceil(self.batch_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}
