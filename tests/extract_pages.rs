//! Page extraction tests against a populated store

use scrawl2org::display::PageSink;
use scrawl2org::storage::Database;
use scrawl2org::{DisplayOptions, PageExtractor, ScrawlError};
use std::path::Path;

struct NullSink;

impl PageSink for NullSink {
    fn supports_inline(&self) -> bool {
        false
    }

    fn display_inline(&mut self, _png: &[u8], _width: Option<u32>, _height: Option<u32>) -> std::io::Result<()> {
        Ok(())
    }

    fn write_raw(&mut self, _png: &[u8]) -> std::io::Result<()> {
        Ok(())
    }
}

fn populated_extractor() -> PageExtractor {
    let mut db = Database::open_in_memory().unwrap();
    let file_id = db.upsert_file("scan.pdf", "0123abcd", None).unwrap();
    for (index, bytes) in [b"one".as_slice(), b"two", b"three"].iter().enumerate() {
        db.upsert_page(file_id, index as u32, bytes, None).unwrap();
    }
    PageExtractor::from_database(db)
}

#[test]
fn test_range_writes_numbered_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("out").join("scan.png");

    let report = populated_extractor().extract(
        "scan.pdf",
        "1-3",
        Some(output.as_path()),
        &DisplayOptions::default(),
        &mut NullSink,
    )?;

    let expected: Vec<_> = ["scan_page001.png", "scan_page002.png", "scan_page003.png"]
        .iter()
        .map(|name| dir.path().join("out").join(name))
        .collect();
    assert_eq!(report.written, expected);
    assert_eq!(std::fs::read(&expected[1])?, b"two".to_vec());
    assert!(!output.exists());

    Ok(())
}

#[test]
fn test_missing_pages_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("scan.jpg");

    let report = populated_extractor().extract(
        "scan.pdf",
        "2, 7",
        Some(output.as_path()),
        &DisplayOptions::default(),
        &mut NullSink,
    )?;

    assert_eq!(report.written, vec![dir.path().join("scan_page002.jpg")]);
    assert_eq!(report.missing, vec![7]);

    Ok(())
}

#[test]
fn test_single_page_uses_output_path_verbatim() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("cover.png");

    let report = populated_extractor().extract(
        "scan.pdf",
        "3",
        Some(output.as_path()),
        &DisplayOptions::default(),
        &mut NullSink,
    )?;

    assert_eq!(report.written, vec![output.clone()]);
    assert_eq!(std::fs::read(&output)?, b"three".to_vec());

    Ok(())
}

#[test]
fn test_unknown_file() {
    let result = populated_extractor().extract(
        "other.pdf",
        "1",
        Some(Path::new("unused.png")),
        &DisplayOptions::default(),
        &mut NullSink,
    );
    assert!(matches!(result, Err(ScrawlError::FileNotFound(name)) if name == "other.pdf"));
}

#[test]
fn test_bad_page_spec_is_rejected_before_lookup() {
    let result = populated_extractor().extract(
        "other.pdf",
        "4-2",
        None,
        &DisplayOptions::default(),
        &mut NullSink,
    );
    assert!(matches!(result, Err(ScrawlError::InvertedRange { start: 4, end: 2 })));
}
