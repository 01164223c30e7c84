//! Database schema definitions

/// Database schema version
pub const SCHEMA_VERSION: u32 = 2;

/// SQL for creating the pdf_files table (one row per source basename)
pub const CREATE_PDF_FILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pdf_files (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL UNIQUE,
    file_hash TEXT NOT NULL,
    last_processed TIMESTAMP
);
"#;

/// SQL for creating the page_images table (one row per file and page)
pub const CREATE_PAGE_IMAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS page_images (
    id INTEGER PRIMARY KEY,
    pdf_file_id INTEGER,
    page_number INTEGER NOT NULL,
    image_data BLOB NOT NULL,
    image_hash TEXT NOT NULL,
    last_updated TIMESTAMP,
    ocr_text JSON,
    FOREIGN KEY (pdf_file_id) REFERENCES pdf_files (id)
);
"#;

/// SQL for the point-lookup and digest indexes on page_images
pub const CREATE_PAGE_IMAGES_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_page_images_pdf_page ON page_images (pdf_file_id, page_number);
CREATE INDEX IF NOT EXISTS idx_page_images_hash ON page_images (image_hash);
"#;

/// SQL for the applied-migrations ledger
pub const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;
