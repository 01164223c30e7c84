//! API layer for scrawl2org
//!
//! This module provides the two workflows: synchronizing PDFs into the store
//! and extracting stored pages back out.

pub mod extractor;
pub mod processor;

// Re-export main API types
pub use extractor::{ExtractReport, PageExtractor};
pub use processor::{PdfProcessor, SyncReport, SyncStatus};
