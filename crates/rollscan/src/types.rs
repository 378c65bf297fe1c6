//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates, top-left origin.
///
/// Produced only when word-level OCR output is available. Immutable once
/// constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    /// Smallest rectangle covering both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }
}

/// One recognized token from word-level OCR output.
///
/// Input-only: produced by the OCR engine, consumed by the record extractor,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    /// Recognition confidence in [0, 100].
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Structured voter record extracted from one text block.
///
/// `confidence`, when present, is the arithmetic mean over all OCR words
/// claimed for both fields. Consumed immediately by the fuzzy matcher; never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterInfo {
    pub name: String,
    pub father: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl VoterInfo {
    pub fn new(name: impl Into<String>, father: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            father: father.into(),
            name_bbox: None,
            father_bbox: None,
            confidence: None,
        }
    }
}

/// One match of a voter record against a search target.
///
/// Created per (record, target) pair clearing the threshold; this is the unit
/// stored in the cache and exported. `bbox` is the matched name's combined
/// box when box-level OCR was used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub file: String,
    pub page: u32,
    pub name: String,
    pub father: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Run-level counters, owned by the coordinator.
///
/// Counters only ever increase. Invariant:
/// `files_processed + files_failed <= documents submitted`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub files_processed: u64,
    pub files_failed: u64,
    pub pages_processed: u64,
    pub matches_found: u64,
    pub errors: Vec<String>,
}

impl ProcessingStats {
    pub fn record_failure(&mut self, document: &str, error: impl std::fmt::Display) {
        self.files_failed += 1;
        self.errors.push(format!("{}: {}", document, error));
    }
}
