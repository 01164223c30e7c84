//! Database migrations and compatibility
//!
//! Every migration is idempotent and inspects the live schema before it
//! changes anything, so stores written by older releases (which have no
//! `schema_migrations` ledger at all) are evolved in place without losing rows.

use crate::error::{Result, ScrawlError};
use crate::storage::schema::*;
use rusqlite::{Connection, params};

/// Migrations in application order: (version, description)
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("initial_schema", "Create pdf_files, page_images and lookup indexes"),
    ("add_ocr_text_column", "Add ocr_text column to page_images"),
];

/// Apply every migration that is not yet recorded
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_MIGRATIONS_TABLE)
        .map_err(|e| ScrawlError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let applied = applied_migrations(conn)?;

    for (version, description) in MIGRATIONS {
        if applied.iter().any(|v| v == version) {
            continue;
        }

        log::info!("Applying migration: {} - {}", version, description);
        apply_migration(conn, version)?;

        conn.execute(
            "INSERT OR IGNORE INTO schema_migrations (version) VALUES (?1)",
            params![version],
        )
        .map_err(|e| ScrawlError::Storage(format!("Failed to record migration {}: {}", version, e)))?;
    }

    Ok(())
}

/// Versions recorded in the ledger, oldest first
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT version FROM schema_migrations ORDER BY applied_at, rowid")
        .map_err(|e| ScrawlError::Storage(format!("Failed to prepare migration query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| ScrawlError::Storage(format!("Failed to execute migration query: {}", e)))?;

    let mut versions = Vec::new();
    for version in rows {
        versions.push(
            version.map_err(|e| ScrawlError::Storage(format!("Failed to read migration version: {}", e)))?,
        );
    }
    Ok(versions)
}

/// Apply a specific migration
fn apply_migration(conn: &Connection, version: &str) -> Result<()> {
    match version {
        "initial_schema" => {
            conn.execute_batch(CREATE_PDF_FILES_TABLE)
                .map_err(|e| ScrawlError::Storage(format!("Failed to create pdf_files table: {}", e)))?;
            conn.execute_batch(CREATE_PAGE_IMAGES_TABLE)
                .map_err(|e| ScrawlError::Storage(format!("Failed to create page_images table: {}", e)))?;
            conn.execute_batch(CREATE_PAGE_IMAGES_INDEXES)
                .map_err(|e| ScrawlError::Storage(format!("Failed to create indexes: {}", e)))?;
            Ok(())
        }
        "add_ocr_text_column" => {
            if !column_exists(conn, "page_images", "ocr_text")? {
                conn.execute("ALTER TABLE page_images ADD COLUMN ocr_text JSON", [])
                    .map_err(|e| ScrawlError::Storage(format!("Failed to add ocr_text column: {}", e)))?;
            }
            Ok(())
        }
        _ => Err(ScrawlError::Storage(format!("Unknown migration version: {}", version))),
    }
}

/// Check for a column via pragma_table_info
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
            params![table, column],
            |row| row.get(0),
        )
        .map_err(|e| ScrawlError::Storage(format!("Failed to inspect table {}: {}", table, e)))?;
    Ok(count > 0)
}
