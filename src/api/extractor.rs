//! PageExtractor - reading stored pages back out
//!
//! Resolves a page spec against a stored file and delivers each page to a
//! file, to the terminal inline, or as raw bytes on stdout.

use crate::config::{Config, DisplayOptions};
use crate::display::PageSink;
use crate::error::{Result, ScrawlError};
use crate::page_spec::parse_page_spec;
use crate::storage::Database;
use crate::utils::{ensure_directory, numbered_output_path};
use std::path::{Path, PathBuf};

/// What an extraction did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractReport {
    /// Files written, in page order
    pub written: Vec<PathBuf>,
    /// 1-based pages shown inline
    pub displayed: Vec<u32>,
    /// 1-based pages requested but absent from the store
    pub missing: Vec<u32>,
    /// Whether raw bytes went to the sink
    pub raw: bool,
}

/// Where a resolved page should go
#[derive(Clone, Copy)]
enum Destination<'a> {
    File(&'a Path),
    Numbered(&'a Path),
    Inline,
    Raw,
}

/// Retrieves stored page bitmaps and OCR results
pub struct PageExtractor {
    db: Database,
}

impl PageExtractor {
    /// Open the configured store
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::from_database(Database::open(&config.database)?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn file_id(&self, basename: &str) -> Result<i64> {
        self.db
            .lookup_file_id(basename)?
            .ok_or_else(|| ScrawlError::FileNotFound(basename.to_string()))
    }

    /// Bitmap of a 1-based page
    pub fn fetch_page(&self, basename: &str, page: u32) -> Result<Vec<u8>> {
        if page < 1 {
            return Err(ScrawlError::NonPositivePage(page.into()));
        }
        let file_id = self.file_id(basename)?;
        self.db
            .read_page(file_id, page - 1)?
            .ok_or_else(|| ScrawlError::PageNotFound {
                file: basename.to_string(),
                page,
            })
    }

    /// OCR result of a 1-based page; `None` when the page was stored without OCR
    pub fn read_ocr_text(&self, basename: &str, page: u32) -> Result<Option<serde_json::Value>> {
        if page < 1 {
            return Err(ScrawlError::NonPositivePage(page.into()));
        }
        let file_id = self.file_id(basename)?;
        if self.db.page_record(file_id, page - 1)?.is_none() {
            return Err(ScrawlError::PageNotFound {
                file: basename.to_string(),
                page,
            });
        }
        self.db.read_ocr(file_id, page - 1)
    }

    /// Extract the pages named by `spec`.
    ///
    /// A single page goes to `output` if given, otherwise inline when the
    /// sink supports it, otherwise raw to the sink. Several pages go to
    /// numbered files beside `output`, or inline; raw output of more than
    /// one page is refused. Pages missing from the store are skipped with a
    /// warning when several were requested, and are an error when only one
    /// was.
    pub fn extract(
        &self,
        basename: &str,
        spec: &str,
        output: Option<&Path>,
        options: &DisplayOptions,
        sink: &mut dyn PageSink,
    ) -> Result<ExtractReport> {
        options.validate()?;
        let pages = parse_page_spec(spec)?;
        let file_id = self.file_id(basename)?;
        let inline = options.use_inline(sink.supports_inline());
        let single = pages.len() == 1;

        let destination = match (output, single) {
            (Some(path), true) => Destination::File(path),
            (Some(path), false) => Destination::Numbered(path),
            (None, _) if inline => Destination::Inline,
            (None, true) => Destination::Raw,
            (None, false) => return Err(ScrawlError::MultiPageToStdout),
        };

        if let Destination::Numbered(path) | Destination::File(path) = destination {
            if let Some(parent) = path.parent() {
                ensure_directory(parent)?;
            }
        }

        let mut report = ExtractReport::default();

        for page in pages {
            let Some(bitmap) = self.db.read_page(file_id, page - 1)? else {
                if single {
                    return Err(ScrawlError::PageNotFound {
                        file: basename.to_string(),
                        page,
                    });
                }
                log::warn!("Page {} not found for {}, skipping", page, basename);
                report.missing.push(page);
                continue;
            };

            match destination {
                Destination::File(path) => {
                    std::fs::write(path, &bitmap)?;
                    log::info!("Extracted page {} to {}", page, path.display());
                    report.written.push(path.to_path_buf());
                }
                Destination::Numbered(path) => {
                    let target = numbered_output_path(path, page);
                    std::fs::write(&target, &bitmap)?;
                    log::info!("Extracted page {} to {}", page, target.display());
                    report.written.push(target);
                }
                Destination::Inline => {
                    sink.display_inline(&bitmap, options.width, options.height)?;
                    report.displayed.push(page);
                }
                Destination::Raw => {
                    sink.write_raw(&bitmap)?;
                    report.raw = true;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        inline: bool,
        displayed: Vec<Vec<u8>>,
        raw: Vec<u8>,
    }

    impl PageSink for RecordingSink {
        fn supports_inline(&self) -> bool {
            self.inline
        }

        fn display_inline(&mut self, png: &[u8], _width: Option<u32>, _height: Option<u32>) -> std::io::Result<()> {
            self.displayed.push(png.to_vec());
            Ok(())
        }

        fn write_raw(&mut self, png: &[u8]) -> std::io::Result<()> {
            self.raw.extend_from_slice(png);
            Ok(())
        }
    }

    fn extractor_with_pages(pages: &[&str]) -> PageExtractor {
        let mut db = Database::open_in_memory().unwrap();
        let file_id = db.upsert_file("doc.pdf", "digest", None).unwrap();
        for (i, page) in pages.iter().enumerate() {
            db.upsert_page(file_id, i as u32, page.as_bytes(), None).unwrap();
        }
        PageExtractor::from_database(db)
    }

    #[test]
    fn test_fetch_page_is_one_based() {
        let extractor = extractor_with_pages(&["first", "second"]);
        assert_eq!(extractor.fetch_page("doc.pdf", 2).unwrap(), b"second".to_vec());
        assert!(matches!(
            extractor.fetch_page("doc.pdf", 3),
            Err(ScrawlError::PageNotFound { page: 3, .. })
        ));
        assert!(matches!(
            extractor.fetch_page("other.pdf", 1),
            Err(ScrawlError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_single_page_raw_when_not_inline() {
        let extractor = extractor_with_pages(&["first"]);
        let mut sink = RecordingSink::default();

        let report = extractor
            .extract("doc.pdf", "1", None, &DisplayOptions::default(), &mut sink)
            .unwrap();

        assert!(report.raw);
        assert_eq!(sink.raw, b"first".to_vec());
    }

    #[test]
    fn test_inline_preferred_when_supported() {
        let extractor = extractor_with_pages(&["first", "second"]);
        let mut sink = RecordingSink {
            inline: true,
            ..Default::default()
        };

        let report = extractor
            .extract("doc.pdf", "1-2", None, &DisplayOptions::default(), &mut sink)
            .unwrap();

        assert_eq!(report.displayed, vec![1, 2]);
        assert_eq!(sink.displayed.len(), 2);
        assert!(sink.raw.is_empty());
    }

    #[test]
    fn test_disable_inline_forces_raw() {
        let extractor = extractor_with_pages(&["first"]);
        let mut sink = RecordingSink {
            inline: true,
            ..Default::default()
        };
        let options = DisplayOptions {
            disable_inline: true,
            ..Default::default()
        };

        let report = extractor.extract("doc.pdf", "1", None, &options, &mut sink).unwrap();
        assert!(report.raw);
        assert!(sink.displayed.is_empty());
    }

    #[test]
    fn test_multiple_pages_to_stdout_refused() {
        let extractor = extractor_with_pages(&["first", "second"]);
        let mut sink = RecordingSink::default();

        let result = extractor.extract("doc.pdf", "1,2", None, &DisplayOptions::default(), &mut sink);
        assert!(matches!(result, Err(ScrawlError::MultiPageToStdout)));
        assert!(sink.raw.is_empty());
    }

    #[test]
    fn test_conflicting_display_flags() {
        let extractor = extractor_with_pages(&["first"]);
        let options = DisplayOptions {
            force_inline: true,
            disable_inline: true,
            ..Default::default()
        };

        let result = extractor.extract("doc.pdf", "1", None, &options, &mut RecordingSink::default());
        assert!(matches!(result, Err(ScrawlError::ConflictingOptions(_))));
    }

    #[test]
    fn test_single_missing_page_is_error() {
        let extractor = extractor_with_pages(&["first"]);
        let result = extractor.extract(
            "doc.pdf",
            "5",
            None,
            &DisplayOptions::default(),
            &mut RecordingSink::default(),
        );
        assert!(matches!(result, Err(ScrawlError::PageNotFound { page: 5, .. })));
    }

    #[test]
    fn test_read_ocr_text() {
        let mut db = Database::open_in_memory().unwrap();
        let file_id = db.upsert_file("doc.pdf", "digest", None).unwrap();
        let ocr = serde_json::json!({"text": "hello", "confidence": 1.0, "engine": "stub"});
        db.upsert_page(file_id, 0, b"first", Some(&ocr)).unwrap();
        db.upsert_page(file_id, 1, b"second", None).unwrap();
        let extractor = PageExtractor::from_database(db);

        assert_eq!(extractor.read_ocr_text("doc.pdf", 1).unwrap().unwrap()["text"], "hello");
        assert!(extractor.read_ocr_text("doc.pdf", 2).unwrap().is_none());
        assert!(matches!(
            extractor.read_ocr_text("doc.pdf", 3),
            Err(ScrawlError::PageNotFound { .. })
        ));
    }
}
