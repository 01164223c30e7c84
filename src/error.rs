//! Error types for scrawl2org
//!
//! This module provides error handling for page-spec parsing, lookups,
//! rendering and storage. OCR failures have their own type in
//! [`crate::ocr::OcrError`] because they are recovered, not propagated.

use thiserror::Error;

/// Main error type for scrawl2org operations
#[derive(Error, Debug)]
pub enum ScrawlError {
    /// A page-spec token is neither a number nor a range
    #[error("Invalid page number: {0}")]
    InvalidPageToken(String),

    /// A page range whose start is greater than its end
    #[error("Invalid range: start ({start}) > end ({end})")]
    InvertedRange { start: i64, end: i64 },

    /// Page numbers are 1-based
    #[error("Page numbers must be >= 1, got: {0}")]
    NonPositivePage(i64),

    /// The page spec resolved to no pages at all
    #[error("No valid page numbers specified")]
    EmptyPageSpec,

    /// Unknown PDF basename in the store
    #[error("PDF file not found in database: {0}")]
    FileNotFound(String),

    /// No stored row for the requested (1-based) page
    #[error("Page {page} not found for PDF: {file}")]
    PageNotFound { file: String, page: u32 },

    /// Mutually exclusive options were combined
    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),

    /// Several pages requested with nowhere to put them but stdout
    #[error(
        "Multiple pages cannot be output to stdout (PNG files cannot be concatenated). Please specify an output file pattern with -o."
    )]
    MultiPageToStdout,

    /// External renderer errors
    #[error("Render error: {0}")]
    Render(String),

    /// Database/storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for scrawl2org operations
pub type Result<T> = std::result::Result<T, ScrawlError>;

impl ScrawlError {
    /// Whether this error came from bad user input rather than the system
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScrawlError::InvalidPageToken(_)
                | ScrawlError::InvertedRange { .. }
                | ScrawlError::NonPositivePage(_)
                | ScrawlError::EmptyPageSpec
                | ScrawlError::ConflictingOptions(_)
                | ScrawlError::MultiPageToStdout
        )
    }
}
