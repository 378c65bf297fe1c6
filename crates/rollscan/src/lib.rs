//! Rollscan - Fuzzy name search over scanned electoral rolls
//!
//! Rollscan searches directories of scanned Bengali electoral-roll PDFs for
//! fuzzy matches against a list of target names. Pages are rasterized with
//! poppler, recognized with tesseract, parsed into labeled voter records, and
//! matched with an order-insensitive token-set scorer tuned for noisy
//! Bengali OCR output. Finished result sets are cached on disk keyed by
//! document content, so re-runs over an unchanged corpus are close to free.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use rollscan::{
//!     PopplerRasterizer, SearchConfig, TesseractEngine, discover_documents, process_documents,
//! };
//!
//! # async fn run() -> rollscan::Result<()> {
//! let config = SearchConfig::from_env();
//! let documents = discover_documents("rolls/".as_ref())?;
//! let rasterizer = Arc::new(PopplerRasterizer::new(config.max_document_pages));
//! let engine = Arc::new(TesseractEngine::new(
//!     config.ocr_language.clone(),
//!     config.psm,
//!     config.page_timeout_secs,
//! ));
//!
//! let outcome = process_documents(
//!     documents,
//!     vec!["রহিম আলী".to_string()],
//!     config,
//!     rasterizer,
//!     engine,
//!     Arc::new(AtomicBool::new(false)),
//! )
//! .await?;
//! println!("{} matches", outcome.results.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): configuration, document discovery, the per-document
//!   pipeline and the bounded-parallel orchestrator
//! - **Text** (`text`): Bengali normalization, token-set fuzzy matching,
//!   labeled-field record extraction
//! - **OCR** (`ocr`): `Rasterizer`/`OcrEngine` seams plus the poppler and
//!   tesseract subprocess implementations
//! - **Cache** (`cache`): content-addressed on-disk result cache
//! - **Export** (`export`): JSON and CSV output

#![deny(unsafe_code)]

pub mod cache;
pub mod core;
pub mod error;
pub mod export;
pub mod ocr;
pub mod text;
pub mod types;
pub mod validation;

pub use cache::{CacheStatsReport, ResultCache};
pub use core::{
    BatchOutcome, DocumentReport, DocumentTask, SearchConfig, discover_documents,
    process_document, process_documents, resolve_worker_count,
};
pub use error::{Result, RollscanError};
pub use export::{ExportFormat, export_results};
pub use ocr::{OcrEngine, OcrEngineError, PageImage, PopplerRasterizer, Rasterizer, RenderError, TesseractEngine};
pub use text::{extract_voter_blocks, extract_voter_blocks_with_boxes, fuzzy_match, normalize, token_set_ratio};
pub use types::{BoundingBox, OcrWord, ProcessingStats, SearchResult, VoterInfo};
pub use validation::{load_target_names, validate_document};
