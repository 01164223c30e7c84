//! PdfProcessor - incremental page synchronization
//!
//! Brings the store in line with a PDF on disk: whole-file digest check
//! first, then per-page bitmap digests, then pruning of pages that no longer
//! exist. OCR runs only for pages that are actually written.

use crate::config::{Config, RenderConfig};
use crate::error::{Result, ScrawlError};
use crate::hash::{hash_bytes, hash_file};
use crate::ocr::{OcrContext, OcrProvider, OcrResult, build_provider};
use crate::render::{PageRenderer, PdftoppmRenderer, RenderedDocument};
use crate::storage::Database;
use crate::utils::{basename, ensure_file_exists};
use std::path::Path;
use std::time::Instant;

/// Outcome of one `process` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Whole-file digest matched; nothing was rendered
    Skipped,
    /// The document was rendered and pages reconciled
    Processed,
}

/// Summary of a synchronization run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub filename: String,
    pub status: SyncStatus,
    pub file_id: Option<i64>,
    /// Pages in the document (0 when skipped)
    pub page_count: usize,
    pub pages_written: usize,
    pub pages_unchanged: usize,
    pub pages_pruned: usize,
    /// Pages whose OCR failed and were stored with a fallback result
    pub ocr_failures: usize,
}

impl SyncReport {
    fn skipped(filename: String, file_id: Option<i64>) -> Self {
        Self {
            filename,
            status: SyncStatus::Skipped,
            file_id,
            page_count: 0,
            pages_written: 0,
            pages_unchanged: 0,
            pages_pruned: 0,
            ocr_failures: 0,
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.status == SyncStatus::Skipped
    }
}

/// Synchronizes PDFs into the page store
pub struct PdfProcessor {
    db: Database,
    renderer: Box<dyn PageRenderer>,
    ocr: Option<Box<dyn OcrProvider>>,
    scale: f32,
}

impl PdfProcessor {
    /// Open the configured store with the poppler renderer and configured OCR
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let db = Database::open(&config.database)?;
        let renderer = PdftoppmRenderer::new(&config.render);
        if !renderer.is_available() {
            log::warn!(
                "{} could not be launched; rendering will fail until poppler-utils is installed",
                config.render.renderer_binary
            );
        }
        let ocr = build_provider(&config.ocr)
            .map_err(|e| ScrawlError::Config(format!("Failed to set up OCR: {}", e)))?;

        Ok(Self::with_components(db, Box::new(renderer), ocr, &config.render))
    }

    /// Assemble from explicit parts
    pub fn with_components(
        db: Database,
        renderer: Box<dyn PageRenderer>,
        ocr: Option<Box<dyn OcrProvider>>,
        render: &RenderConfig,
    ) -> Self {
        Self {
            db,
            renderer,
            ocr,
            scale: render.scale,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    /// Synchronize one PDF into the store.
    ///
    /// With `force`, every page is rewritten and its timestamp refreshed even
    /// when nothing changed.
    pub fn process<P: AsRef<Path>>(&mut self, pdf_path: P, force: bool) -> Result<SyncReport> {
        let pdf_path = pdf_path.as_ref();
        ensure_file_exists(pdf_path)?;

        let filename = basename(pdf_path)?;
        let digest = hash_file(pdf_path)?;

        let (unchanged, existing_id) = self.db.file_digest_matches(&filename, &digest)?;
        if unchanged && !force {
            log::info!("PDF unchanged, skipping: {}", filename);
            return Ok(SyncReport::skipped(filename, existing_id));
        }

        log::info!("Processing PDF: {}", pdf_path.display());
        let file_id = self.db.upsert_file(&filename, &digest, existing_id)?;

        let mut document = self.renderer.open(pdf_path)?;
        let outcome = self.sync_pages(document.as_mut(), &filename, file_id, force);
        let closed = document.close();

        let mut report = outcome?;
        closed?;

        let keep = u32::try_from(report.page_count)
            .map_err(|_| ScrawlError::Render(format!("Too many pages: {}", report.page_count)))?;
        report.pages_pruned = self.db.prune_pages_beyond(file_id, keep)?;
        if report.pages_pruned > 0 {
            log::info!("Removed {} stale page(s) from {}", report.pages_pruned, filename);
        }

        log::info!(
            "Finished {}: {} page(s), {} written, {} unchanged",
            filename,
            report.page_count,
            report.pages_written,
            report.pages_unchanged
        );
        Ok(report)
    }

    fn sync_pages(
        &mut self,
        document: &mut dyn RenderedDocument,
        filename: &str,
        file_id: i64,
        force: bool,
    ) -> Result<SyncReport> {
        let page_count = document.page_count();
        let mut report = SyncReport {
            filename: filename.to_string(),
            status: SyncStatus::Processed,
            file_id: Some(file_id),
            page_count,
            pages_written: 0,
            pages_unchanged: 0,
            pages_pruned: 0,
            ocr_failures: 0,
        };

        for index in 0..page_count {
            let page_number = u32::try_from(index)
                .map_err(|_| ScrawlError::Render(format!("Page index out of range: {}", index)))?;
            let bitmap = document.render_page(index, self.scale)?;

            if !force {
                let digest = hash_bytes(&bitmap);
                if self.db.existing_page_digest(file_id, page_number)?.as_deref() == Some(digest.as_str()) {
                    log::info!("Page {} unchanged, skipping", page_number + 1);
                    report.pages_unchanged += 1;
                    continue;
                }
            }

            let ocr = self.run_ocr(&bitmap, page_number + 1, filename);
            if ocr.as_ref().is_some_and(OcrResult::is_fallback) {
                report.ocr_failures += 1;
            }
            let ocr_json = ocr.as_ref().map(OcrResult::to_json);

            let write = if force {
                self.db.overwrite_page(file_id, page_number, &bitmap, ocr_json.as_ref())?
            } else {
                self.db.upsert_page(file_id, page_number, &bitmap, ocr_json.as_ref())?
            };

            if !write.wrote() {
                report.pages_unchanged += 1;
                continue;
            }

            log::info!(
                "Processed page {}/{} ({} bytes)",
                page_number + 1,
                page_count,
                bitmap.len()
            );
            if let Some(result) = &ocr {
                let text = result.text.trim();
                if text.is_empty() {
                    log::info!("OCR text: (no text detected)");
                } else {
                    log::info!("OCR text: {}", text);
                }
            }
            report.pages_written += 1;
        }

        Ok(report)
    }

    /// Run OCR, turning any provider failure into a fallback result
    fn run_ocr(&self, bitmap: &[u8], page_number: u32, filename: &str) -> Option<OcrResult> {
        let provider = self.ocr.as_ref()?;
        let context = OcrContext::new(page_number, filename);
        let start = Instant::now();

        match provider.extract(bitmap, &context) {
            Ok(result) => {
                log::debug!(
                    "OCR page {}: {} chars in {}ms",
                    page_number,
                    result.text.len(),
                    result.processing_time_ms
                );
                Some(result)
            }
            Err(e) => {
                log::warn!("OCR failed for page {} of {}: {}", page_number, filename, e);
                Some(OcrResult::fallback(
                    provider.engine(),
                    provider.model(),
                    &e,
                    start.elapsed(),
                ))
            }
        }
    }

    /// Number of pages the renderer sees in `pdf_path`
    pub fn page_count<P: AsRef<Path>>(&self, pdf_path: P) -> Result<usize> {
        let pdf_path = pdf_path.as_ref();
        ensure_file_exists(pdf_path)?;

        let mut document = self.renderer.open(pdf_path)?;
        let count = document.page_count();
        document.close()?;
        Ok(count)
    }

    /// Render one zero-based page without touching the store
    pub fn render_single_page<P: AsRef<Path>>(&self, pdf_path: P, index: usize) -> Result<Vec<u8>> {
        let pdf_path = pdf_path.as_ref();
        ensure_file_exists(pdf_path)?;

        let mut document = self.renderer.open(pdf_path)?;
        let rendered = if index >= document.page_count() {
            Err(ScrawlError::Render(format!(
                "Page index {} out of range (document has {} pages)",
                index,
                document.page_count()
            )))
        } else {
            document.render_page(index, self.scale)
        };
        let closed = document.close();

        let bitmap = rendered?;
        closed?;
        Ok(bitmap)
    }
}
