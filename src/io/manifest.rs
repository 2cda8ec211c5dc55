//! Tab-separated manifest reading
//!
//! A manifest has a header row and at least a `path` column whose values are
//! file paths relative to a caller-supplied base directory. Other columns
//! (speaker id, sentence, votes, ...) are ignored.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::error::{PipelineError, Result};

/// Name of the required manifest column
pub const PATH_COLUMN: &str = "path";

/// Read a manifest and resolve each row's `path` against `base_dir`
///
/// # Returns
///
/// Resolved paths in manifest order
///
/// # Errors
///
/// Returns `ManifestError` if the manifest cannot be read, has no `path`
/// column, contains a malformed row, or a row has an empty `path` value
pub fn read_manifest(manifest_path: &Path, base_dir: &Path) -> Result<Vec<PathBuf>> {
    log::debug!(
        "Reading manifest {} (base directory {})",
        manifest_path.display(),
        base_dir.display()
    );

    // Sentences in speech corpora carry bare quotes, so quoting is off
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_path(manifest_path)
        .map_err(|e| PipelineError::manifest(manifest_path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::manifest(manifest_path, e))?;
    let path_col = headers
        .iter()
        .position(|h| h.trim() == PATH_COLUMN)
        .ok_or_else(|| {
            PipelineError::manifest(
                manifest_path,
                format!("missing required column '{}'", PATH_COLUMN),
            )
        })?;

    let mut paths = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PipelineError::manifest(manifest_path, e))?;
        // Row numbers are 1-based and count the header
        let line = row + 2;
        let value = record.get(path_col).map(str::trim).unwrap_or("");
        if value.is_empty() {
            return Err(PipelineError::manifest(
                manifest_path,
                format!("row {} has an empty '{}' value", line, PATH_COLUMN),
            ));
        }
        paths.push(base_dir.join(value));
    }

    log::debug!("Manifest {} lists {} files", manifest_path.display(), paths.len());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("train.tsv");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_resolves_paths_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(
            dir.path(),
            "client_id\tpath\tsentence\n\
             a1\tclip_1.mp3\tHe said \"hello\" twice\n\
             b2\tclip_2.mp3\tAnother line\n",
        );

        let paths = read_manifest(&manifest, Path::new("/corpus/clips")).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/corpus/clips/clip_1.mp3"),
                PathBuf::from("/corpus/clips/clip_2.mp3"),
            ]
        );
    }

    #[test]
    fn test_header_only_manifest_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(dir.path(), "path\n");
        let paths = read_manifest(&manifest, dir.path()).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_missing_path_column() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(dir.path(), "file\tsentence\nclip.wav\thi\n");
        let err = read_manifest(&manifest, dir.path()).unwrap_err();
        match err {
            PipelineError::ManifestError { reason, .. } => assert!(reason.contains("path")),
            other => panic!("expected ManifestError, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(&dir.path().join("absent.tsv"), dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ManifestError { .. }));
    }

    #[test]
    fn test_empty_path_value_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = write_manifest(dir.path(), "id\tpath\n1\ta.wav\n2\t\n");
        let err = read_manifest(&manifest, dir.path()).unwrap_err();
        match err {
            PipelineError::ManifestError { reason, .. } => assert!(reason.contains("row 3")),
            other => panic!("expected ManifestError, got {:?}", other),
        }
    }
}
