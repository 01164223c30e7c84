//! Utility functions for scrawl2org
//!
//! Path and formatting helpers shared by the processor, extractor and CLI.

use crate::error::{Result, ScrawlError};
use std::path::{Path, PathBuf};

/// Default extension for exported pages
pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// The final path component, which identifies a file in the store
pub fn basename<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| ScrawlError::Generic(format!("Path has no usable file name: {}", path.display())))
}

/// Check the source exists before hashing or rendering it
pub fn ensure_file_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ScrawlError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }
    Ok(())
}

/// Output path for one page of a multi-page export.
///
/// `out/scan.png` with page 4 becomes `out/scan_page004.png`. The extension
/// is kept verbatim and defaults to `.png`.
pub fn numbered_output_path<P: AsRef<Path>>(output: P, page: u32) -> PathBuf {
    let output = output.as_ref();
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let extension = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string());

    let file_name = format!("{}_page{:03}.{}", stem, page, extension);
    match output.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Create directory if it doesn't exist
pub fn ensure_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path).map_err(ScrawlError::Io)?;
    }

    Ok(())
}

/// Format file size in human readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_basename() {
        assert_eq!(basename("/tmp/notes/scan.pdf").unwrap(), "scan.pdf");
        assert_eq!(basename("scan.pdf").unwrap(), "scan.pdf");
        assert!(basename("/").is_err());
    }

    #[test]
    fn test_ensure_file_exists() {
        let temp_file = NamedTempFile::new().unwrap();
        assert!(ensure_file_exists(temp_file.path()).is_ok());

        match ensure_file_exists("/definitely/not/here.pdf") {
            Err(ScrawlError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_numbered_output_path() {
        assert_eq!(
            numbered_output_path("out/scan.png", 4),
            PathBuf::from("out/scan_page004.png")
        );
        assert_eq!(numbered_output_path("scan.jpg", 12), PathBuf::from("scan_page012.jpg"));
        assert_eq!(numbered_output_path("out/scan", 1), PathBuf::from("out/scan_page001.png"));
    }

    #[test]
    fn test_numbered_output_path_wide_pages() {
        // Padding is a minimum width; four-digit pages stay distinct
        assert_eq!(numbered_output_path("a.png", 1000), PathBuf::from("a_page1000.png"));
    }

    #[test]
    fn test_file_size_formatting() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }
}
