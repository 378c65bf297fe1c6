//! Document discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RollscanError};

/// Recursively collect `*.pdf` files under a directory, sorted by path.
///
/// Sorting makes run output and test expectations stable across platforms.
/// Unreadable subdirectories are skipped with a warning rather than failing
/// the whole discovery.
pub fn discover_documents(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(RollscanError::validation(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let mut documents = Vec::new();
    collect_pdfs(root, &mut documents);
    documents.sort();

    tracing::info!(dir = %root.display(), count = documents.len(), "discovered documents");
    Ok(documents)
}

fn collect_pdfs(dir: &Path, documents: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_pdfs(&path, documents);
        } else if is_pdf(&path) {
            documents.push(path);
        }
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}
