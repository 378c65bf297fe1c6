//! Input validation for documents and names files.
//!
//! Everything here runs before any expensive work. Failures are
//! [`RollscanError::Validation`] so callers can tell caller-fixable input
//! problems apart from system failures.

use std::fs;
use std::io::Read as _;
use std::path::Path;

use crate::error::{Result, RollscanError};

/// PDF magic bytes at offset zero.
const PDF_MAGIC: &[u8] = b"%PDF-";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Check that a path points at a plausible, acceptably sized PDF.
///
/// Rejects missing paths, non-files, files over `max_size_mb`, and files that
/// do not start with the PDF magic bytes. Cheap: reads at most five bytes.
pub fn validate_document(path: &Path, max_size_mb: u64) -> Result<()> {
    if !path.exists() {
        return Err(RollscanError::validation(format!(
            "document not found: {}",
            path.display()
        )));
    }

    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(RollscanError::validation(format!(
            "not a regular file: {}",
            path.display()
        )));
    }

    let max_bytes = max_size_mb * BYTES_PER_MB;
    if metadata.len() > max_bytes {
        return Err(RollscanError::validation(format!(
            "document too large: {} is {:.1} MB, limit is {} MB",
            path.display(),
            metadata.len() as f64 / BYTES_PER_MB as f64,
            max_size_mb
        )));
    }

    let mut magic = [0u8; 5];
    let mut file = fs::File::open(path)?;
    let read = file.read(&mut magic)?;
    if read < PDF_MAGIC.len() || magic != PDF_MAGIC {
        return Err(RollscanError::validation(format!(
            "not a PDF document: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Load and validate the target names file.
///
/// One name per line, UTF-8, trimmed, blank lines skipped. Enforces the file
/// size ceiling and truncates to `max_names` with a warning. An empty result
/// is an error: a search with no targets is always a caller mistake.
pub fn load_target_names(path: &Path, max_file_size_mb: u64, max_names: usize) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(RollscanError::validation(format!(
            "names file not found: {}",
            path.display()
        )));
    }

    let metadata = fs::metadata(path)?;
    let max_bytes = max_file_size_mb * BYTES_PER_MB;
    if metadata.len() > max_bytes {
        return Err(RollscanError::validation(format!(
            "names file too large: {} is {:.1} MB, limit is {} MB",
            path.display(),
            metadata.len() as f64 / BYTES_PER_MB as f64,
            max_file_size_mb
        )));
    }

    let bytes = fs::read(path)?;
    let content = String::from_utf8(bytes).map_err(|e| RollscanError::Validation {
        message: format!("names file is not valid UTF-8: {}", path.display()),
        source: Some(Box::new(e)),
    })?;

    let mut names: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if names.len() > max_names {
        tracing::warn!(
            found = names.len(),
            kept = max_names,
            "names file exceeds the target limit, truncating"
        );
        names.truncate(max_names);
    }

    if names.is_empty() {
        return Err(RollscanError::validation(format!(
            "names file contains no names: {}",
            path.display()
        )));
    }

    tracing::debug!(count = names.len(), "loaded target names");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_validate_document_accepts_pdf() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roll.pdf");
        fs::write(&path, b"%PDF-1.7 rest of file").unwrap();

        assert!(validate_document(&path, 50).is_ok());
    }

    #[test]
    fn test_validate_document_missing() {
        let dir = tempdir().unwrap();
        let err = validate_document(&dir.path().join("absent.pdf"), 50).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_validate_document_rejects_directory() {
        let dir = tempdir().unwrap();
        let err = validate_document(dir.path(), 50).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_validate_document_rejects_wrong_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();

        let err = validate_document(&path, 50).unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }

    #[test]
    fn test_validate_document_rejects_tiny_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stub.pdf");
        fs::write(&path, b"%PD").unwrap();

        assert!(validate_document(&path, 50).is_err());
    }

    #[test]
    fn test_validate_document_rejects_oversized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.pdf");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"%PDF-1.4").unwrap();
        f.write_all(&vec![0u8; 2 * 1024 * 1024]).unwrap();

        let err = validate_document(&path, 1).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_load_target_names_trims_and_skips_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, "  রহিম আলী  \n\nকরিম আলী\n   \n").unwrap();

        let names = load_target_names(&path, 10, 1000).unwrap();
        assert_eq!(names, vec!["রহিম আলী", "করিম আলী"]);
    }

    #[test]
    fn test_load_target_names_empty_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, "\n  \n\n").unwrap();

        let err = load_target_names(&path, 10, 1000).unwrap_err();
        assert!(err.to_string().contains("no names"));
    }

    #[test]
    fn test_load_target_names_truncates_to_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, "a\nb\nc\nd\n").unwrap();

        let names = load_target_names(&path, 10, 2).unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_load_target_names_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = load_target_names(&path, 10, 1000).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_load_target_names_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_target_names(&dir.path().join("absent.txt"), 10, 1000).unwrap_err();
        assert!(err.is_input_error());
    }
}
