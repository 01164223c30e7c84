//! Page rendering for scrawl2org
//!
//! The processor only sees these traits; the rasteriser behind them is a
//! black box that turns a page index into a self-describing image buffer.

pub mod pdftoppm;

pub use pdftoppm::PdftoppmRenderer;

use crate::error::Result;
use std::path::Path;

/// Opens source documents for rendering
pub trait PageRenderer {
    /// Open a document; the caller must `close` it when done
    fn open(&self, path: &Path) -> Result<Box<dyn RenderedDocument>>;
}

/// An opened document
pub trait RenderedDocument {
    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Render a zero-based page to compressed image bytes (PNG)
    fn render_page(&mut self, index: usize, scale: f32) -> Result<Vec<u8>>;

    /// Release any resources held for this document
    fn close(&mut self) -> Result<()>;
}
