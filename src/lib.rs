//! # scrawl2org
//!
//! Incremental extraction of PDF page images into SQLite. Each page is
//! rendered to PNG, keyed by its SHA-256 digest and stored with an optional
//! OCR result, so reprocessing a document only rewrites pages that changed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrawl2org::{Config, DisplayOptions, PageExtractor, PdfProcessor, TerminalSink};
//! use std::path::Path;
//!
//! fn main() -> scrawl2org::Result<()> {
//!     let config = Config::default();
//!
//!     // Render and store every page, skipping unchanged ones
//!     let mut processor = PdfProcessor::new(&config)?;
//!     let report = processor.process("notes.pdf", false)?;
//!     println!("{} page(s) written", report.pages_written);
//!
//!     // Write pages 1-3 to out/notes_page001.png ...
//!     let extractor = PageExtractor::from_database(processor.into_database());
//!     extractor.extract(
//!         "notes.pdf",
//!         "1-3",
//!         Some(Path::new("out/notes.png")),
//!         &DisplayOptions::default(),
//!         &mut TerminalSink,
//!     )?;
//!
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod hash;
pub mod ocr;
pub mod page_spec;
pub mod render;
pub mod storage;
pub mod utils;

// Re-export main API types
pub use api::{ExtractReport, PageExtractor, PdfProcessor, SyncReport, SyncStatus};
pub use config::{Config, DisplayOptions, OcrConfig, OcrEngine, RenderConfig};
pub use error::{Result, ScrawlError};

// Re-export commonly used types
pub use display::{KittyDisplay, PageSink, TerminalSink};
pub use ocr::{OcrContext, OcrError, OcrProvider, OcrResult};
pub use page_spec::parse_page_spec;
pub use render::{PageRenderer, PdftoppmRenderer, RenderedDocument};
pub use storage::{Database, PageWrite};
