//! Poppler-based renderer
//!
//! Page counts come from parsing the PDF with `lopdf`; rasterisation shells
//! out to `pdftoppm`, one page per invocation, into a scratch directory that
//! lives as long as the opened document.

use crate::config::RenderConfig;
use crate::error::{Result, ScrawlError};
use crate::render::{PageRenderer, RenderedDocument};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Renderer backed by the `pdftoppm` executable
#[derive(Debug, Clone)]
pub struct PdftoppmRenderer {
    binary: String,
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl PdftoppmRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            binary: config.renderer_binary.clone(),
        }
    }

    /// Check whether the executable can be launched
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-v")
            .output()
            .map(|_| true)
            .unwrap_or(false)
    }
}

impl PageRenderer for PdftoppmRenderer {
    fn open(&self, path: &Path) -> Result<Box<dyn RenderedDocument>> {
        let document = lopdf::Document::load(path)
            .map_err(|e| ScrawlError::Render(format!("Failed to open PDF {}: {}", path.display(), e)))?;
        let page_count = document.get_pages().len();

        let scratch = TempDir::new()?;

        log::debug!("Opened {} ({} pages)", path.display(), page_count);

        Ok(Box::new(PdftoppmDocument {
            binary: self.binary.clone(),
            source: path.to_path_buf(),
            page_count,
            scratch: Some(scratch),
        }))
    }
}

struct PdftoppmDocument {
    binary: String,
    source: PathBuf,
    page_count: usize,
    scratch: Option<TempDir>,
}

impl RenderedDocument for PdftoppmDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&mut self, index: usize, scale: f32) -> Result<Vec<u8>> {
        if index >= self.page_count {
            return Err(ScrawlError::Render(format!(
                "Page {} does not exist in PDF ({} pages)",
                index, self.page_count
            )));
        }

        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| ScrawlError::Render("Document already closed".to_string()))?;

        // pdftoppm pages are 1-based
        let page = (index + 1).to_string();
        let dpi = RenderConfig::dpi_for(scale).to_string();
        let prefix = scratch.path().join(format!("page-{}", index));

        let output = Command::new(&self.binary)
            .args(["-png", "-singlefile", "-r", &dpi, "-f", &page, "-l", &page])
            .arg(&self.source)
            .arg(&prefix)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ScrawlError::Render(format!(
                    "{} not found; install poppler-utils",
                    self.binary
                )),
                _ => ScrawlError::Render(format!("Failed to run {}: {}", self.binary, e)),
            })?;

        if !output.status.success() {
            return Err(ScrawlError::Render(format!(
                "{} failed on page {}: {}",
                self.binary,
                index + 1,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let image_path = prefix.with_extension("png");
        let bytes = std::fs::read(&image_path).map_err(|e| {
            ScrawlError::Render(format!("No image generated for page {}: {}", index + 1, e))
        })?;
        // best effort; the directory is removed on close anyway
        let _ = std::fs::remove_file(&image_path);

        Ok(bytes)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(scratch) = self.scratch.take() {
            scratch.close()?;
        }
        Ok(())
    }
}
