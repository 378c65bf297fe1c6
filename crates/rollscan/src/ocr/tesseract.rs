//! Tesseract-backed recognition.
//!
//! Pages are written to a temp file and recognized by the `tesseract` binary:
//! plain `txt` output for text mode, `tsv` output for word-level mode. Each
//! invocation runs under a poll-and-kill deadline so a pathological page
//! cannot stall a worker.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use super::{OcrEngine, OcrEngineError, PageImage};
use crate::types::{BoundingBox, OcrWord};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Recognizes page images by shelling out to `tesseract`.
pub struct TesseractEngine {
    language: String,
    psm: u32,
    page_timeout_secs: u64,
}

impl TesseractEngine {
    pub fn new(language: impl Into<String>, psm: u32, page_timeout_secs: u64) -> Self {
        Self {
            language: language.into(),
            psm,
            page_timeout_secs,
        }
    }

    /// Run one tesseract invocation producing `<out_base>.<config>`.
    fn run(&self, page: &PageImage, config: &str) -> Result<String, OcrEngineError> {
        let work_dir = tempfile::tempdir()?;
        let input_path = work_dir.path().join("page.png");
        let out_base = work_dir.path().join("out");

        page.image
            .save(&input_path)
            .map_err(|e| OcrEngineError::Recognition(format!("failed to write page image: {}", e)))?;

        let child = Command::new("tesseract")
            .arg(&input_path)
            .arg(&out_base)
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg(config)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrEngineError::EngineUnavailable(
                        "tesseract not found, install tesseract-ocr".to_string(),
                    )
                } else {
                    OcrEngineError::Io(e)
                }
            })?;

        let status = self.wait_with_deadline(child)?;
        if !status.success() {
            return Err(OcrEngineError::Recognition(format!(
                "tesseract exited with {} on page {}",
                status, page.page_number
            )));
        }

        let out_path = out_base.with_extension(config);
        read_output(&out_path)
    }

    fn wait_with_deadline(&self, mut child: Child) -> Result<std::process::ExitStatus, OcrEngineError> {
        let deadline = Instant::now() + Duration::from_secs(self.page_timeout_secs);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OcrEngineError::Timeout(self.page_timeout_secs));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

fn read_output(path: &Path) -> Result<String, OcrEngineError> {
    std::fs::read_to_string(path)
        .map_err(|e| OcrEngineError::Recognition(format!("tesseract produced no output: {}", e)))
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, page: &PageImage) -> Result<String, OcrEngineError> {
        let text = self.run(page, "txt")?;
        tracing::debug!(page = page.page_number, chars = text.len(), "recognized page");
        Ok(text)
    }

    fn recognize_with_words(&self, page: &PageImage) -> Result<Vec<OcrWord>, OcrEngineError> {
        let tsv = self.run(page, "tsv")?;
        let words = parse_tsv(&tsv);
        tracing::debug!(page = page.page_number, words = words.len(), "recognized page words");
        Ok(words)
    }
}

/// Parse tesseract TSV output into words.
///
/// Columns: level, page_num, block_num, par_num, line_num, word_num, left,
/// top, width, height, conf, text. Word rows have level 5; rows with negative
/// confidence are layout artifacts and are skipped.
fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    let mut words = Vec::new();

    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 || fields[0] != "5" {
            continue;
        }

        let parsed = (
            fields[6].parse::<u32>(),
            fields[7].parse::<u32>(),
            fields[8].parse::<u32>(),
            fields[9].parse::<u32>(),
            fields[10].parse::<f64>(),
        );
        let (Ok(left), Ok(top), Ok(width), Ok(height), Ok(confidence)) = parsed else {
            continue;
        };
        if confidence < 0.0 {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        words.push(OcrWord {
            text: text.to_string(),
            confidence,
            bbox: BoundingBox::new(left, top, width, height),
        });
    }

    words
}
