//! Storage functionality for scrawl2org
//!
//! This module provides database operations using embedded SQLite: one row
//! per source file keyed by basename, and one row per rendered page keyed by
//! `(pdf_file_id, page_number)`.

pub mod database;
pub mod migrations;
pub mod schema;

// Re-export main types
pub use database::Database;

use chrono::{DateTime, Utc};

/// What `upsert_page` / `overwrite_page` did to a page row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWrite {
    /// No row existed; one was inserted
    Inserted,
    /// An existing row was rewritten
    Updated,
    /// Digest matched; nothing was written
    Unchanged,
}

impl PageWrite {
    /// Whether a row was written
    pub fn wrote(&self) -> bool {
        !matches!(self, PageWrite::Unchanged)
    }
}

/// A stored source file
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFileRecord {
    pub id: i64,
    pub filename: String,
    pub file_hash: String,
    pub last_processed: Option<DateTime<Utc>>,
}

/// Metadata of a stored page (the bitmap itself is fetched separately)
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub file_id: i64,
    /// Zero-based page index
    pub page_number: u32,
    pub image_hash: String,
    pub last_updated: Option<DateTime<Utc>>,
    /// Bitmap size in bytes
    pub image_size: usize,
    pub has_ocr: bool,
}

/// Store-wide counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub file_count: usize,
    pub page_count: usize,
    pub total_image_bytes: u64,
}
