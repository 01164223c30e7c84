//! Placeholder OCR provider
//!
//! Produces deterministic debug text without looking at the image. Useful
//! for exercising the pipeline offline.

use super::types::{OcrError, OcrResult};
use super::{OcrContext, OcrProvider};

#[derive(Debug, Clone, Default)]
pub struct StubOcr;

impl StubOcr {
    pub fn new() -> Self {
        Self
    }
}

impl OcrProvider for StubOcr {
    fn engine(&self) -> &str {
        "stub"
    }

    fn extract(&self, _bitmap: &[u8], context: &OcrContext) -> Result<OcrResult, OcrError> {
        Ok(OcrResult {
            text: format!("DEBUG STUB INFO{}", context.describe()),
            confidence: 1.0,
            processing_time_ms: 0,
            engine: self.engine().to_string(),
            model: None,
            version: Some("0.1.0".to_string()),
            error: None,
            metadata: None,
        })
    }
}
