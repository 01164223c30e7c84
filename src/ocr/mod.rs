//! OCR providers for scrawl2org
//!
//! A provider turns a page bitmap into an [`OcrResult`] or an [`OcrError`].
//! Providers never recover on their own; the processor decides what a
//! failure becomes (see [`OcrResult::fallback`]).

pub mod llm;
pub mod stub;
pub mod types;

pub use llm::LlmOcr;
pub use stub::StubOcr;
pub use types::{FALLBACK_ENGINE, OcrError, OcrResult};

use crate::config::{OcrConfig, OcrEngine};

/// Optional context passed along with a bitmap
#[derive(Debug, Clone, Default)]
pub struct OcrContext {
    /// 1-based page number
    pub page_number: Option<u32>,
    /// Source file basename
    pub filename: Option<String>,
}

impl OcrContext {
    pub fn new(page_number: u32, filename: impl Into<String>) -> Self {
        Self {
            page_number: Some(page_number),
            filename: Some(filename.into()),
        }
    }

    /// Human-readable suffix such as " - Page 3 from doc.pdf"
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(page) = self.page_number {
            out.push_str(&format!(" - Page {}", page));
        }
        if let Some(name) = &self.filename {
            out.push_str(&format!(" from {}", name));
        }
        out
    }
}

/// Trait for OCR providers.
pub trait OcrProvider {
    /// Engine identifier recorded on results.
    fn engine(&self) -> &str;

    /// Model name, if applicable.
    fn model(&self) -> Option<String> {
        None
    }

    /// Extract text from a compressed image buffer.
    fn extract(&self, bitmap: &[u8], context: &OcrContext) -> Result<OcrResult, OcrError>;
}

/// Build the provider selected by `config`; `None` when OCR is disabled
pub fn build_provider(config: &OcrConfig) -> Result<Option<Box<dyn OcrProvider>>, OcrError> {
    if !config.enabled {
        return Ok(None);
    }

    let provider: Box<dyn OcrProvider> = match config.engine {
        OcrEngine::Stub => Box::new(StubOcr::new()),
        OcrEngine::Llm => Box::new(LlmOcr::from_config(config)?),
    };

    log::debug!(
        "OCR provider: {} (model: {})",
        provider.engine(),
        provider.model().unwrap_or_else(|| "-".to_string())
    );
    Ok(Some(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_description() {
        assert_eq!(OcrContext::new(3, "doc.pdf").describe(), " - Page 3 from doc.pdf");
        assert_eq!(OcrContext::default().describe(), "");
    }

    #[test]
    fn test_build_provider_respects_config() {
        let disabled = OcrConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(build_provider(&disabled).unwrap().is_none());

        let stub = build_provider(&OcrConfig::default()).unwrap().unwrap();
        assert_eq!(stub.engine(), "stub");

        let llm = build_provider(&OcrConfig {
            engine: OcrEngine::Llm,
            model: Some("gpt-4o".to_string()),
            ..Default::default()
        })
        .unwrap()
        .unwrap();
        assert_eq!(llm.engine(), "llm");
        assert_eq!(llm.model().as_deref(), Some("gpt-4o"));
    }
}
