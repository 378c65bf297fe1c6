//! In-process fakes for the rasterizer and OCR engine seams, plus fixture
//! builders shared by the integration suites.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rollscan::{
    OcrEngine, OcrEngineError, OcrWord, PageImage, Rasterizer, RenderError, SearchConfig,
};

/// A voter block in the layout the extractor expects.
pub fn voter_block(name: &str, father: &str) -> String {
    format!("নাম : {}\nপিতার নাম : {}\n", name, father)
}

/// Write a minimal file that passes document validation.
pub fn write_pdf(dir: &Path, name: &str) -> PathBuf {
    write_pdf_with_content(dir, name, b"%PDF-1.4 fixture")
}

pub fn write_pdf_with_content(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn test_config() -> SearchConfig {
    let mut config = SearchConfig::default();
    config.use_cache = false;
    config
}

/// Rasterizer fake: page count or corruption per file name, with a default
/// page count for unlisted documents.
pub struct MockRasterizer {
    pub default_pages: u32,
    pub corrupt: HashSet<String>,
    pub page_counts: HashMap<String, u32>,
}

impl MockRasterizer {
    pub fn with_pages(default_pages: u32) -> Self {
        Self {
            default_pages,
            corrupt: HashSet::new(),
            page_counts: HashMap::new(),
        }
    }

    pub fn corrupt_file(mut self, name: &str) -> Self {
        self.corrupt.insert(name.to_string());
        self
    }

    pub fn pages_for(mut self, name: &str, pages: u32) -> Self {
        self.page_counts.insert(name.to_string(), pages);
        self
    }
}

impl Rasterizer for MockRasterizer {
    fn render(&self, path: &Path, _dpi: u32) -> Result<Vec<PageImage>, RenderError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.corrupt.contains(&file_name) {
            return Err(RenderError::CorruptDocument("unparsable fixture".to_string()));
        }

        let pages = self
            .page_counts
            .get(&file_name)
            .copied()
            .unwrap_or(self.default_pages);
        Ok((1..=pages).map(PageImage::blank).collect())
    }
}

/// OCR engine fake keyed by page number. All documents in a batch share the
/// same page texts; per-document failures are exercised through the
/// rasterizer instead.
#[derive(Default)]
pub struct MockEngine {
    pub texts: HashMap<u32, String>,
    pub words: HashMap<u32, Vec<OcrWord>>,
    pub timeout_pages: HashSet<u32>,
    pub failing_pages: HashSet<u32>,
    pub unavailable: bool,
}

impl MockEngine {
    pub fn with_page_text(page: u32, text: impl Into<String>) -> Self {
        let mut engine = Self::default();
        engine.texts.insert(page, text.into());
        engine
    }

    pub fn and_page_text(mut self, page: u32, text: impl Into<String>) -> Self {
        self.texts.insert(page, text.into());
        self
    }

    pub fn and_page_words(mut self, page: u32, words: Vec<OcrWord>) -> Self {
        self.words.insert(page, words);
        self
    }

    pub fn and_timeout_on(mut self, page: u32) -> Self {
        self.timeout_pages.insert(page);
        self
    }
}

impl OcrEngine for MockEngine {
    fn recognize(&self, page: &PageImage) -> Result<String, OcrEngineError> {
        if self.unavailable {
            return Err(OcrEngineError::EngineUnavailable(
                "tesseract not installed".to_string(),
            ));
        }
        if self.timeout_pages.contains(&page.page_number) {
            return Err(OcrEngineError::Timeout(30));
        }
        if self.failing_pages.contains(&page.page_number) {
            return Err(OcrEngineError::Recognition("garbled page".to_string()));
        }
        Ok(self
            .texts
            .get(&page.page_number)
            .cloned()
            .unwrap_or_default())
    }

    fn recognize_with_words(&self, page: &PageImage) -> Result<Vec<OcrWord>, OcrEngineError> {
        if self.unavailable {
            return Err(OcrEngineError::EngineUnavailable(
                "tesseract not installed".to_string(),
            ));
        }
        Ok(self
            .words
            .get(&page.page_number)
            .cloned()
            .unwrap_or_default())
    }
}
