//! Search configuration.
//!
//! Every knob has a serde default so partial TOML files work; a handful of
//! limits can additionally be overridden through `ROLLSCAN_*` environment
//! variables, which win over file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RollscanError};

fn default_dpi() -> u32 {
    350
}

fn default_ocr_language() -> String {
    "ben".to_string()
}

fn default_psm() -> u32 {
    6
}

fn default_threshold() -> u32 {
    82
}

fn default_page_timeout_secs() -> u64 {
    30
}

fn default_max_document_size_mb() -> u64 {
    50
}

fn default_max_document_pages() -> u32 {
    100
}

fn default_max_names_file_size_mb() -> u64 {
    10
}

fn default_max_target_names() -> usize {
    1000
}

fn default_min_confidence() -> f64 {
    60.0
}

fn default_use_cache() -> bool {
    true
}

fn default_cache_ttl_days() -> u64 {
    30
}

/// All tunables for one search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Rasterization resolution.
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Tesseract language model.
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,

    /// Tesseract page segmentation mode.
    #[serde(default = "default_psm")]
    pub psm: u32,

    /// Fuzzy match threshold in [0, 100].
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Per-page OCR deadline.
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    #[serde(default = "default_max_document_size_mb")]
    pub max_document_size_mb: u64,

    #[serde(default = "default_max_document_pages")]
    pub max_document_pages: u32,

    #[serde(default = "default_max_names_file_size_mb")]
    pub max_names_file_size_mb: u64,

    #[serde(default = "default_max_target_names")]
    pub max_target_names: usize,

    /// Request word-level OCR output and attach bounding boxes to matches.
    #[serde(default)]
    pub box_level: bool,

    /// In box mode, drop records whose attached confidence falls below this.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default = "default_use_cache")]
    pub use_cache: bool,

    /// Cache directory override; `~/.rollscan-cache` when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_cache_ttl_days")]
    pub cache_ttl_days: u64,

    /// Worker count override; resolved against the CPU count when unset.
    #[serde(default)]
    pub max_workers: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            ocr_language: default_ocr_language(),
            psm: default_psm(),
            threshold: default_threshold(),
            page_timeout_secs: default_page_timeout_secs(),
            max_document_size_mb: default_max_document_size_mb(),
            max_document_pages: default_max_document_pages(),
            max_names_file_size_mb: default_max_names_file_size_mb(),
            max_target_names: default_max_target_names(),
            box_level: false,
            min_confidence: default_min_confidence(),
            use_cache: default_use_cache(),
            cache_dir: None,
            cache_ttl_days: default_cache_ttl_days(),
            max_workers: None,
        }
    }
}

impl SearchConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: SearchConfig =
            toml::from_str(&content).map_err(|e| RollscanError::Validation {
                message: format!("invalid config file {}: {}", path.display(), e),
                source: Some(Box::new(e)),
            })?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Environment variables win over file values. Unparsable values are
    /// logged and ignored rather than failing the run.
    pub fn apply_env_overrides(&mut self) {
        env_override("ROLLSCAN_DPI", &mut self.dpi);
        env_override("ROLLSCAN_MAX_PDF_SIZE_MB", &mut self.max_document_size_mb);
        env_override("ROLLSCAN_MAX_PDF_PAGES", &mut self.max_document_pages);
        env_override(
            "ROLLSCAN_MAX_NAMES_FILE_SIZE_MB",
            &mut self.max_names_file_size_mb,
        );
        env_override("ROLLSCAN_MAX_SEARCH_NAMES", &mut self.max_target_names);

        if let Ok(lang) = std::env::var("ROLLSCAN_OCR_LANG") {
            if lang.trim().is_empty() {
                tracing::warn!("ignoring empty ROLLSCAN_OCR_LANG");
            } else {
                self.ocr_language = lang;
            }
        }
    }

    /// Validate cross-field constraints not expressible through serde.
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(RollscanError::validation(format!(
                "threshold must be in 0..=100, got {}",
                self.threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(RollscanError::validation(format!(
                "min_confidence must be in 0..=100, got {}",
                self.min_confidence
            )));
        }
        if self.dpi == 0 {
            return Err(RollscanError::validation("dpi must be positive"));
        }
        Ok(())
    }
}

fn env_override<T: std::str::FromStr>(var: &str, field: &mut T) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse() {
            Ok(value) => *field = value,
            Err(_) => tracing::warn!(var, value = %raw, "ignoring unparsable override"),
        }
    }
}
