//! Poppler-backed page rasterization.
//!
//! Shells out to `pdfinfo` for the page count and `pdftoppm` for rendering.
//! Both binaries ship with poppler-utils on every target platform.

use std::path::Path;
use std::process::{Command, Stdio};

use super::{PageImage, RenderError, Rasterizer};

/// Renders PDF pages to PNG via `pdftoppm`.
pub struct PopplerRasterizer {
    max_pages: u32,
}

impl PopplerRasterizer {
    pub fn new(max_pages: u32) -> Self {
        Self { max_pages }
    }

    fn page_count(&self, path: &Path) -> Result<u32, RenderError> {
        let output = Command::new("pdfinfo")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::Unavailable("pdfinfo not found, install poppler-utils".to_string())
                } else {
                    RenderError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::CorruptDocument(format!(
                "pdfinfo failed: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout).ok_or_else(|| {
            RenderError::BadPageCount("pdfinfo reported no page count".to_string())
        })
    }

    /// Last page to render. Documents over the ceiling are truncated, not
    /// rejected.
    fn last_page(&self, declared: u32) -> u32 {
        declared.min(self.max_pages)
    }
}

impl Rasterizer for PopplerRasterizer {
    fn render(&self, path: &Path, dpi: u32) -> Result<Vec<PageImage>, RenderError> {
        let pages = self.page_count(path)?;
        if pages == 0 {
            return Err(RenderError::BadPageCount(
                "document has no pages".to_string(),
            ));
        }
        let last_page = self.last_page(pages);
        if last_page < pages {
            tracing::warn!(
                doc = %path.display(),
                pages,
                limit = self.max_pages,
                "document exceeds the page limit, rendering the first pages only"
            );
        }

        let out_dir = tempfile::tempdir()?;
        let prefix = out_dir.path().join("page");

        let output = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(last_page.to_string())
            .arg(path)
            .arg(&prefix)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::Unavailable("pdftoppm not found, install poppler-utils".to_string())
                } else {
                    RenderError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lower = stderr.to_lowercase();
            if lower.contains("syntax") || lower.contains("damaged") || lower.contains("couldn't read") {
                return Err(RenderError::CorruptDocument(stderr.trim().to_string()));
            }
            return Err(RenderError::Conversion(stderr.trim().to_string()));
        }

        // pdftoppm names output page-1.png .. page-N.png, zero-padding the
        // index as needed. The trailing digits are the page number.
        let mut rendered = Vec::new();
        for entry in std::fs::read_dir(out_dir.path())? {
            let entry_path = entry?.path();
            let Some(page_number) = page_number_from_name(&entry_path) else {
                continue;
            };
            let image = image::open(&entry_path).map_err(|e| {
                RenderError::Conversion(format!("failed to load rendered page: {}", e))
            })?;
            rendered.push(PageImage { page_number, image });
        }

        if rendered.is_empty() {
            return Err(RenderError::Conversion(
                "pdftoppm produced no output".to_string(),
            ));
        }

        rendered.sort_by_key(|p| p.page_number);
        tracing::debug!(doc = %path.display(), pages = rendered.len(), dpi, "rendered document");
        Ok(rendered)
    }
}

fn parse_page_count(pdfinfo_output: &str) -> Option<u32> {
    pdfinfo_output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse().ok())
}

fn page_number_from_name(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_last_page_clamped_to_limit() {
        let rasterizer = PopplerRasterizer::new(100);
        assert_eq!(rasterizer.last_page(150), 100);
        assert_eq!(rasterizer.last_page(100), 100);
        assert_eq!(rasterizer.last_page(3), 3);
    }

    #[test]
    fn test_parse_page_count() {
        let output = "Title:          Voter Roll\nPages:          42\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output), Some(42));
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: x\n"), None);
        assert_eq!(parse_page_count(""), None);
    }

    #[test]
    fn test_page_number_from_name() {
        assert_eq!(page_number_from_name(&PathBuf::from("/t/page-1.png")), Some(1));
        assert_eq!(page_number_from_name(&PathBuf::from("/t/page-007.png")), Some(7));
        assert_eq!(page_number_from_name(&PathBuf::from("/t/page-12.png")), Some(12));
    }

    #[test]
    fn test_page_number_from_name_rejects_non_png() {
        assert_eq!(page_number_from_name(&PathBuf::from("/t/page-1.txt")), None);
        assert_eq!(page_number_from_name(&PathBuf::from("/t/notes.png")), None);
    }
}
