//! SQLite database operations for scrawl2org
//!
//! A [`Database`] owns one connection for its whole lifetime. Writes take
//! `&mut self`, so a single writer is enforced by the borrow checker rather
//! than by locks, and every public call commits on its own: a crash between
//! calls never loses pages that were already stored.

use crate::error::{Result, ScrawlError};
use crate::hash::hash_bytes;
use crate::storage::migrations::run_migrations;
use crate::storage::schema::SCHEMA_VERSION;
use crate::storage::{PageRecord, PageWrite, PdfFileRecord, StoreStats};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// Database connection and operations
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| ScrawlError::Storage(format!("Failed to open database {}: {}", path.display(), e)))?;

        let mut db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScrawlError::Storage(format!("Failed to create in-memory database: {}", e)))?;

        let mut db = Self { conn, path: None };
        db.initialize()?;
        Ok(db)
    }

    /// Location on disk, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Initialize database schema
    fn initialize(&mut self) -> Result<()> {
        if self.path.is_some() {
            let _: String = self
                .conn
                .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
                .map_err(|e| ScrawlError::Storage(format!("Failed to enable WAL mode: {}", e)))?;
        }

        run_migrations(&self.conn)?;

        log::debug!("Database initialized with schema version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Compare a candidate digest against the stored one for `basename`.
    ///
    /// Returns `(changed, existing_id)`; an unknown basename is reported as
    /// changed with no id.
    pub fn file_digest_matches(&self, basename: &str, digest: &str) -> Result<(bool, Option<i64>)> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT id, file_hash FROM pdf_files WHERE filename = ?1",
                params![basename],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to query file {}: {}", basename, e)))?;

        Ok(match row {
            None => (true, None),
            Some((id, stored)) => (stored != digest, Some(id)),
        })
    }

    /// Record a file's digest and processing time, returning its stable id
    pub fn upsert_file(&mut self, basename: &str, digest: &str, id: Option<i64>) -> Result<i64> {
        let now = Utc::now();

        match id {
            None => self
                .conn
                .query_row(
                    r#"
                    INSERT INTO pdf_files (filename, file_hash, last_processed)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(filename) DO UPDATE SET
                        file_hash = excluded.file_hash,
                        last_processed = excluded.last_processed
                    RETURNING id
                    "#,
                    params![basename, digest, now],
                    |row| row.get(0),
                )
                .map_err(|e| ScrawlError::Storage(format!("Failed to insert file {}: {}", basename, e))),
            Some(id) => {
                let updated = self
                    .conn
                    .execute(
                        "UPDATE pdf_files SET filename = ?1, file_hash = ?2, last_processed = ?3 WHERE id = ?4",
                        params![basename, digest, now, id],
                    )
                    .map_err(|e| ScrawlError::Storage(format!("Failed to update file {}: {}", basename, e)))?;

                if updated == 0 {
                    return Err(ScrawlError::Storage(format!(
                        "No PDF file record with id {} to update",
                        id
                    )));
                }
                Ok(id)
            }
        }
    }

    /// Stored digest for a page, if the page was ever stored
    pub fn existing_page_digest(&self, file_id: i64, page_number: u32) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT image_hash FROM page_images WHERE pdf_file_id = ?1 AND page_number = ?2",
                params![file_id, page_number],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to query page {}: {}", page_number, e)))
    }

    /// Store a page unless its bitmap digest is unchanged.
    ///
    /// An unchanged digest performs no write at all, OCR included.
    pub fn upsert_page(
        &mut self,
        file_id: i64,
        page_number: u32,
        bitmap: &[u8],
        ocr: Option<&serde_json::Value>,
    ) -> Result<PageWrite> {
        let image_hash = hash_bytes(bitmap);
        let ocr_json = ocr.map(serde_json::to_string).transpose()?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| ScrawlError::Storage(format!("Failed to start transaction: {}", e)))?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT image_hash FROM page_images WHERE pdf_file_id = ?1 AND page_number = ?2",
                params![file_id, page_number],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to query page {}: {}", page_number, e)))?;

        let outcome = match existing {
            None => {
                insert_page(&tx, file_id, page_number, bitmap, &image_hash, ocr_json.as_deref())?;
                PageWrite::Inserted
            }
            Some(stored) if stored != image_hash => {
                update_page(&tx, file_id, page_number, bitmap, &image_hash, ocr_json.as_deref())?;
                PageWrite::Updated
            }
            Some(_) => PageWrite::Unchanged,
        };

        tx.commit()
            .map_err(|e| ScrawlError::Storage(format!("Failed to commit transaction: {}", e)))?;

        Ok(outcome)
    }

    /// Store a page unconditionally, refreshing digest, timestamp and OCR
    pub fn overwrite_page(
        &mut self,
        file_id: i64,
        page_number: u32,
        bitmap: &[u8],
        ocr: Option<&serde_json::Value>,
    ) -> Result<PageWrite> {
        let image_hash = hash_bytes(bitmap);
        let ocr_json = ocr.map(serde_json::to_string).transpose()?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| ScrawlError::Storage(format!("Failed to start transaction: {}", e)))?;

        let updated = update_page(&tx, file_id, page_number, bitmap, &image_hash, ocr_json.as_deref())?;
        let outcome = if updated == 0 {
            insert_page(&tx, file_id, page_number, bitmap, &image_hash, ocr_json.as_deref())?;
            PageWrite::Inserted
        } else {
            PageWrite::Updated
        };

        tx.commit()
            .map_err(|e| ScrawlError::Storage(format!("Failed to commit transaction: {}", e)))?;

        Ok(outcome)
    }

    /// Delete every page of `file_id` at or beyond `keep_count`
    pub fn prune_pages_beyond(&mut self, file_id: i64, keep_count: u32) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM page_images WHERE pdf_file_id = ?1 AND page_number >= ?2",
                params![file_id, keep_count],
            )
            .map_err(|e| ScrawlError::Storage(format!("Failed to prune pages: {}", e)))
    }

    /// Stored bitmap for a 0-based page
    pub fn read_page(&self, file_id: i64, page_number: u32) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT image_data FROM page_images WHERE pdf_file_id = ?1 AND page_number = ?2",
                params![file_id, page_number],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to read page {}: {}", page_number, e)))
    }

    /// Stored OCR payload for a 0-based page
    pub fn read_ocr(&self, file_id: i64, page_number: u32) -> Result<Option<serde_json::Value>> {
        let raw: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT ocr_text FROM page_images WHERE pdf_file_id = ?1 AND page_number = ?2",
                params![file_id, page_number],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to read OCR for page {}: {}", page_number, e)))?;

        match raw.flatten() {
            Some(json) if !json.is_empty() => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }

    /// Replace the OCR payload of an existing page without touching its digest.
    ///
    /// Returns false when no such page is stored.
    pub fn update_ocr(&mut self, file_id: i64, page_number: u32, ocr: &serde_json::Value) -> Result<bool> {
        let ocr_json = serde_json::to_string(ocr)?;
        let updated = self
            .conn
            .execute(
                "UPDATE page_images SET ocr_text = ?1 WHERE pdf_file_id = ?2 AND page_number = ?3",
                params![ocr_json, file_id, page_number],
            )
            .map_err(|e| ScrawlError::Storage(format!("Failed to update OCR for page {}: {}", page_number, e)))?;
        Ok(updated > 0)
    }

    /// Resolve a basename to its id
    pub fn lookup_file_id(&self, basename: &str) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM pdf_files WHERE filename = ?1",
                params![basename],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to look up file {}: {}", basename, e)))
    }

    /// All stored basenames, sorted
    pub fn list_files(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT filename FROM pdf_files ORDER BY filename")
            .map_err(|e| ScrawlError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ScrawlError::Storage(format!("Failed to list files: {}", e)))?;

        let mut result = Vec::new();
        for name in rows {
            result.push(name.map_err(|e| ScrawlError::Storage(format!("Failed to process file row: {}", e)))?);
        }
        Ok(result)
    }

    /// Number of stored pages for a file
    pub fn count_pages(&self, file_id: i64) -> Result<u32> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM page_images WHERE pdf_file_id = ?1",
                params![file_id],
                |row| row.get(0),
            )
            .map_err(|e| ScrawlError::Storage(format!("Failed to count pages: {}", e)))?;
        Ok(count as u32)
    }

    /// Full file row for a basename
    pub fn file_record(&self, basename: &str) -> Result<Option<PdfFileRecord>> {
        self.conn
            .query_row(
                "SELECT id, filename, file_hash, last_processed FROM pdf_files WHERE filename = ?1",
                params![basename],
                |row| {
                    Ok(PdfFileRecord {
                        id: row.get(0)?,
                        filename: row.get(1)?,
                        file_hash: row.get(2)?,
                        last_processed: row.get::<_, Option<DateTime<Utc>>>(3)?,
                    })
                },
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to read file {}: {}", basename, e)))
    }

    /// Page row metadata without the bitmap payload
    pub fn page_record(&self, file_id: i64, page_number: u32) -> Result<Option<PageRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT page_number, image_hash, last_updated, length(image_data), ocr_text IS NOT NULL
                FROM page_images WHERE pdf_file_id = ?1 AND page_number = ?2
                "#,
                params![file_id, page_number],
                |row| {
                    Ok(PageRecord {
                        file_id,
                        page_number: row.get(0)?,
                        image_hash: row.get(1)?,
                        last_updated: row.get::<_, Option<DateTime<Utc>>>(2)?,
                        image_size: row.get::<_, i64>(3)? as usize,
                        has_ocr: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(|e| ScrawlError::Storage(format!("Failed to read page {}: {}", page_number, e)))
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        self.conn
            .query_row(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM pdf_files),
                    (SELECT COUNT(*) FROM page_images),
                    (SELECT COALESCE(SUM(length(image_data)), 0) FROM page_images)
                "#,
                [],
                |row| {
                    Ok(StoreStats {
                        file_count: row.get::<_, i64>(0)? as usize,
                        page_count: row.get::<_, i64>(1)? as usize,
                        total_image_bytes: row.get::<_, i64>(2)? as u64,
                    })
                },
            )
            .map_err(|e| ScrawlError::Storage(format!("Failed to get database stats: {}", e)))
    }
}

fn insert_page(
    conn: &Connection,
    file_id: i64,
    page_number: u32,
    bitmap: &[u8],
    image_hash: &str,
    ocr_json: Option<&str>,
) -> Result<usize> {
    conn.execute(
        r#"
        INSERT INTO page_images (pdf_file_id, page_number, image_data, image_hash, last_updated, ocr_text)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![file_id, page_number, bitmap, image_hash, Utc::now(), ocr_json],
    )
    .map_err(|e| ScrawlError::Storage(format!("Failed to insert page {}: {}", page_number, e)))
}

fn update_page(
    conn: &Connection,
    file_id: i64,
    page_number: u32,
    bitmap: &[u8],
    image_hash: &str,
    ocr_json: Option<&str>,
) -> Result<usize> {
    conn.execute(
        r#"
        UPDATE page_images
        SET image_data = ?1, image_hash = ?2, last_updated = ?3, ocr_text = ?4
        WHERE pdf_file_id = ?5 AND page_number = ?6
        "#,
        params![bitmap, image_hash, Utc::now(), ocr_json, file_id, page_number],
    )
    .map_err(|e| ScrawlError::Storage(format!("Failed to update page {}: {}", page_number, e)))
}
