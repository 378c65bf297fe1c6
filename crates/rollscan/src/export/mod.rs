//! Result export to JSON and CSV.

use std::path::Path;

use crate::error::{Result, RollscanError};
use crate::types::SearchResult;

/// Output format for [`export_results`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    /// Pick by file extension; unknown extensions are an error.
    Auto,
}

impl ExportFormat {
    fn resolve(self, path: &Path) -> Result<ExportFormat> {
        match self {
            ExportFormat::Auto => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_ascii_lowercase);
                match ext.as_deref() {
                    Some("json") => Ok(ExportFormat::Json),
                    Some("csv") => Ok(ExportFormat::Csv),
                    _ => Err(RollscanError::validation(format!(
                        "cannot infer export format from {}, use --format",
                        path.display()
                    ))),
                }
            }
            other => Ok(other),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = RollscanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "auto" => Ok(ExportFormat::Auto),
            other => Err(RollscanError::validation(format!(
                "unknown export format: {}",
                other
            ))),
        }
    }
}

/// Write results to a file in the requested format.
pub fn export_results(results: &[SearchResult], path: &Path, format: ExportFormat) -> Result<()> {
    match format.resolve(path)? {
        ExportFormat::Json => export_json(results, path),
        ExportFormat::Csv => export_csv(results, path),
        ExportFormat::Auto => unreachable!("resolve never returns Auto"),
    }?;
    tracing::info!(path = %path.display(), count = results.len(), "exported results");
    Ok(())
}

fn export_json(results: &[SearchResult], path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(results)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// The spatial columns appear only when at least one result carries them, so
/// plain text-mode exports stay narrow.
fn export_csv(results: &[SearchResult], path: &Path) -> Result<()> {
    let with_boxes = results.iter().any(|r| r.bbox.is_some() || r.confidence.is_some());

    let mut writer = csv::Writer::from_path(path)?;

    if with_boxes {
        writer.write_record([
            "file",
            "page",
            "name",
            "father",
            "bbox_left",
            "bbox_top",
            "bbox_width",
            "bbox_height",
            "confidence",
        ])?;
        for result in results {
            let bbox = result.bbox;
            writer.write_record([
                result.file.clone(),
                result.page.to_string(),
                result.name.clone(),
                result.father.clone(),
                bbox.map(|b| b.left.to_string()).unwrap_or_default(),
                bbox.map(|b| b.top.to_string()).unwrap_or_default(),
                bbox.map(|b| b.width.to_string()).unwrap_or_default(),
                bbox.map(|b| b.height.to_string()).unwrap_or_default(),
                result
                    .confidence
                    .map(|c| format!("{:.1}", c))
                    .unwrap_or_default(),
            ])?;
        }
    } else {
        writer.write_record(["file", "page", "name", "father"])?;
        for result in results {
            writer.write_record([
                result.file.clone(),
                result.page.to_string(),
                result.name.clone(),
                result.father.clone(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use tempfile::tempdir;

    fn plain_result() -> SearchResult {
        SearchResult {
            file: "roll.pdf".to_string(),
            page: 3,
            name: "রহিম আলী".to_string(),
            father: "করিম আলী".to_string(),
            bbox: None,
            confidence: None,
        }
    }

    fn boxed_result() -> SearchResult {
        SearchResult {
            bbox: Some(BoundingBox::new(10, 20, 120, 18)),
            confidence: Some(88.5),
            ..plain_result()
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("auto".parse::<ExportFormat>().unwrap(), ExportFormat::Auto);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_auto_resolves_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        export_results(&[plain_result()], &path, ExportFormat::Auto).unwrap();

        let parsed: Vec<SearchResult> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![plain_result()]);
    }

    #[test]
    fn test_auto_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let err = export_results(&[], &dir.path().join("out.xml"), ExportFormat::Auto).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_csv_plain_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_results(&[plain_result()], &path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("file,page,name,father"));
        assert_eq!(lines.next(), Some("roll.pdf,3,রহিম আলী,করিম আলী"));
    }

    #[test]
    fn test_csv_spatial_columns_when_boxed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_results(&[boxed_result(), plain_result()], &path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("file,page,name,father,bbox_left,bbox_top,bbox_width,bbox_height,confidence")
        );
        assert_eq!(
            lines.next(),
            Some("roll.pdf,3,রহিম আলী,করিম আলী,10,20,120,18,88.5")
        );
        // Box-less rows in a mixed export leave the spatial cells empty.
        assert_eq!(lines.next(), Some("roll.pdf,3,রহিম আলী,করিম আলী,,,,,"));
    }

    #[test]
    fn test_json_empty_results() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        export_results(&[], &path, ExportFormat::Json).unwrap();

        let parsed: Vec<SearchResult> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }
}
