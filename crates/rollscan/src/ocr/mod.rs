//! Rasterization and OCR seams.
//!
//! The pipeline only ever talks to the [`Rasterizer`] and [`OcrEngine`]
//! traits. The production implementations shell out to poppler and tesseract;
//! tests substitute in-process fakes. Both traits are synchronous because
//! every call runs on a blocking worker thread, never on the async runtime.

pub mod poppler;
pub mod tesseract;

use image::DynamicImage;
use thiserror::Error;

use crate::types::OcrWord;

pub use poppler::PopplerRasterizer;
pub use tesseract::TesseractEngine;

/// One rendered document page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page number within the source document.
    pub page_number: u32,
    pub image: DynamicImage,
}

impl PageImage {
    pub fn new(page_number: u32, image: DynamicImage) -> Self {
        Self { page_number, image }
    }

    /// A 1x1 placeholder page, for engines that ignore pixel data.
    pub fn blank(page_number: u32) -> Self {
        Self {
            page_number,
            image: DynamicImage::new_rgb8(1, 1),
        }
    }
}

/// Rasterization failures, classified so the pipeline can map them to the
/// right run-level error.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The declared page count is missing or zero. Over-limit counts are not
    /// errors; the rasterizer truncates those.
    #[error("bad page count: {0}")]
    BadPageCount(String),

    /// The renderer could not parse the document at all.
    #[error("corrupt document: {0}")]
    CorruptDocument(String),

    /// Rendering started but failed partway.
    #[error("conversion failed: {0}")]
    Conversion(String),

    /// The rendering binary is not installed.
    #[error("renderer unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Recognition failures, classified per page.
#[derive(Debug, Error)]
pub enum OcrEngineError {
    /// The page did not finish within the configured budget.
    #[error("recognition timed out after {0} seconds")]
    Timeout(u64),

    /// The OCR binary is not installed. Document-fatal, not page-scoped.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// The engine ran but failed on this page.
    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Renders document pages to images.
pub trait Rasterizer: Send + Sync {
    /// Render every page of the document at the given resolution.
    ///
    /// Pages come back in document order with 1-based numbering.
    fn render(&self, path: &std::path::Path, dpi: u32) -> Result<Vec<PageImage>, RenderError>;
}

/// Recognizes text on a rendered page.
pub trait OcrEngine: Send + Sync {
    /// Plain-text recognition of one page.
    fn recognize(&self, page: &PageImage) -> Result<String, OcrEngineError>;

    /// Word-level recognition: each recognized word with its box and
    /// confidence. Used only in box-level mode.
    fn recognize_with_words(&self, page: &PageImage) -> Result<Vec<OcrWord>, OcrEngineError>;
}
