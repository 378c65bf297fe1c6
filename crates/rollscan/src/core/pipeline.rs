//! Single-document search pipeline.
//!
//! Fully synchronous: the orchestrator runs it on blocking worker threads.
//! Page-level recognition failures are recovered locally; validation and
//! dependency failures abort the document and surface to the coordinator.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::config::SearchConfig;
use crate::error::{Result, RollscanError};
use crate::ocr::{OcrEngine, OcrEngineError, Rasterizer, RenderError};
use crate::text::{extract_voter_blocks, extract_voter_blocks_with_boxes, fuzzy_match};
use crate::types::{SearchResult, VoterInfo};
use crate::validation::validate_document;

/// Everything one worker needs to process one document. Moved by value into
/// the worker task; shared pieces are behind `Arc`.
#[derive(Clone)]
pub struct DocumentTask {
    pub path: PathBuf,
    pub targets: Arc<Vec<String>>,
    pub config: Arc<SearchConfig>,
}

/// Outcome of one document run.
#[derive(Debug, Default)]
pub struct DocumentReport {
    pub results: Vec<SearchResult>,
    /// Pages the pipeline worked through, including skipped ones.
    pub pages_processed: u64,
    /// Subset of processed pages dropped after a recoverable recognition
    /// failure; these contribute no matches.
    pub pages_skipped: u64,
}

/// Run the full pipeline for one document: validate, render, recognize each
/// page, extract records, match against every target.
///
/// Every record is matched against every target independently; a record
/// matching two targets yields two results.
pub fn process_document(
    task: &DocumentTask,
    rasterizer: &dyn Rasterizer,
    engine: &dyn OcrEngine,
) -> Result<DocumentReport> {
    let config = &task.config;
    let file_name = task
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| task.path.display().to_string());

    validate_document(&task.path, config.max_document_size_mb)?;
    tracing::info!(doc = %file_name, "processing document");

    let mut pages = rasterizer
        .render(&task.path, config.dpi)
        .map_err(map_render_error)?;

    if pages.len() > config.max_document_pages as usize {
        tracing::warn!(
            doc = %file_name,
            pages = pages.len(),
            limit = config.max_document_pages,
            "document exceeds the page limit, truncating"
        );
        pages.truncate(config.max_document_pages as usize);
    }

    let mut report = DocumentReport::default();

    for page in &pages {
        let text = match engine.recognize(page) {
            Ok(text) => text,
            Err(e) => {
                handle_page_error(e, &file_name, page.page_number, &mut report)?;
                continue;
            }
        };

        report.pages_processed += 1;

        let voters = if config.box_level {
            let words = match engine.recognize_with_words(page) {
                Ok(words) => words,
                Err(OcrEngineError::EngineUnavailable(msg)) => {
                    return Err(RollscanError::MissingDependency(msg));
                }
                Err(e) => {
                    // The text pass already succeeded, so degrade to
                    // box-less records instead of dropping the page.
                    tracing::warn!(
                        doc = %file_name,
                        page = page.page_number,
                        error = %e,
                        "word-level pass failed, continuing without boxes"
                    );
                    Vec::new()
                }
            };
            let voters = extract_voter_blocks_with_boxes(&text, &words);
            filter_by_confidence(voters, config.min_confidence, &file_name, page.page_number)
        } else {
            extract_voter_blocks(&text)
        };
        tracing::debug!(doc = %file_name, page = page.page_number, records = voters.len(), "extracted records");

        for voter in &voters {
            for target in task.targets.iter() {
                if fuzzy_match(&voter.name, target, config.threshold) {
                    tracing::info!(
                        doc = %file_name,
                        page = page.page_number,
                        name = %voter.name,
                        "match found"
                    );
                    report.results.push(SearchResult {
                        file: file_name.clone(),
                        page: page.page_number,
                        name: voter.name.clone(),
                        father: voter.father.clone(),
                        bbox: voter.name_bbox,
                        confidence: voter.confidence,
                    });
                }
            }
        }
    }

    Ok(report)
}

/// Records carrying a confidence below the floor are dropped; records the
/// word matcher could not score at all are kept.
fn filter_by_confidence(
    voters: Vec<VoterInfo>,
    min_confidence: f64,
    file_name: &str,
    page_number: u32,
) -> Vec<VoterInfo> {
    voters
        .into_iter()
        .filter(|v| match v.confidence {
            Some(confidence) if confidence < min_confidence => {
                tracing::debug!(
                    doc = %file_name,
                    page = page_number,
                    name = %v.name,
                    confidence,
                    "dropping low-confidence record"
                );
                false
            }
            _ => true,
        })
        .collect()
}

// The coordinator prefixes the document name when recording failures, so
// messages here carry only the render detail.
fn map_render_error(error: RenderError) -> RollscanError {
    match error {
        RenderError::BadPageCount(_) | RenderError::CorruptDocument(_) => {
            RollscanError::Validation {
                message: error.to_string(),
                source: Some(Box::new(error)),
            }
        }
        RenderError::Unavailable(msg) => RollscanError::MissingDependency(msg),
        RenderError::Conversion(_) | RenderError::Io(_) => RollscanError::Conversion {
            message: error.to_string(),
            source: Some(Box::new(error)),
        },
    }
}

/// Recoverable page errors skip the page; a missing engine aborts the
/// document.
fn handle_page_error(
    error: OcrEngineError,
    file_name: &str,
    page_number: u32,
    report: &mut DocumentReport,
) -> Result<()> {
    match error {
        OcrEngineError::EngineUnavailable(msg) => Err(RollscanError::MissingDependency(msg)),
        OcrEngineError::Timeout(secs) => {
            tracing::warn!(doc = %file_name, page = page_number, timeout_secs = secs, "OCR timeout, skipping page");
            report.pages_processed += 1;
            report.pages_skipped += 1;
            Ok(())
        }
        OcrEngineError::Recognition(msg) => {
            tracing::warn!(doc = %file_name, page = page_number, error = %msg, "recognition failed, skipping page");
            report.pages_processed += 1;
            report.pages_skipped += 1;
            Ok(())
        }
        OcrEngineError::Io(e) => {
            tracing::warn!(doc = %file_name, page = page_number, error = %e, "page IO failure, skipping page");
            report.pages_processed += 1;
            report.pages_skipped += 1;
            Ok(())
        }
    }
}
