//! Error types for rollscan.
//!
//! All fallible operations in the library return [`Result`]. The taxonomy
//! mirrors how failures are scoped at runtime:
//!
//! - `Io` - File system errors. These always bubble up unchanged so users can
//!   report real system problems.
//! - `Validation` - Caller-fixable input errors (bad path, oversized file,
//!   wrong magic bytes, malformed names file). Scoped to one document or one
//!   input, never the whole run.
//! - `Conversion` - Document rasterization failures other than corruption.
//! - `Cache` - Cache read/write problems. Callers treat these as recoverable;
//!   the cache itself never lets them escape its public API.
//! - `MissingDependency` - A required external binary (tesseract, pdftoppm)
//!   is not installed. Document-fatal.
//!
//! Recognition failures never reach this taxonomy: the pipeline recovers them
//! at page scope, and a missing engine surfaces as `MissingDependency`.

use thiserror::Error;

/// Result type alias using [`RollscanError`].
pub type Result<T> = std::result::Result<T, RollscanError>;

/// Main error type for all rollscan operations.
#[derive(Debug, Error)]
pub enum RollscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Conversion error: {message}")]
    Conversion {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cache error: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for RollscanError {
    fn from(err: serde_json::Error) -> Self {
        RollscanError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<csv::Error> for RollscanError {
    fn from(err: csv::Error) -> Self {
        RollscanError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl RollscanError {
    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a Cache error.
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
            source: None,
        }
    }

    /// True for errors the caller can fix by supplying different input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, RollscanError::Validation { .. })
    }
}
