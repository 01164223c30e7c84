//! OCR result and error types

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Engine tag written on results produced by the failure path
pub const FALLBACK_ENGINE: &str = "fallback";

/// Errors from OCR providers.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Provider not available: {0}")]
    NotAvailable(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        OcrError::Http(err.to_string())
    }
}

/// Structured OCR output, stored verbatim as JSON next to its page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrResult {
    /// Extracted text content.
    pub text: String,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Which engine produced this result.
    pub engine: String,
    /// Which model was used, for engines that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Set only on fallback results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Engine-specific details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl OcrResult {
    /// Build the record stored when a provider fails
    pub fn fallback(provider: &str, model: Option<String>, error: &OcrError, elapsed: Duration) -> Self {
        let message = error.to_string();
        Self {
            text: format!("[OCR Error: {}]", message),
            confidence: 0.0,
            processing_time_ms: elapsed.as_millis() as u64,
            engine: FALLBACK_ENGINE.to_string(),
            model,
            version: None,
            error: Some(message),
            metadata: Some(serde_json::json!({
                "provider": provider,
                "failed": true,
            })),
        }
    }

    /// Whether this result came from the failure path
    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    /// Convert to the opaque payload the store keeps
    pub fn to_json(&self) -> serde_json::Value {
        // a struct of strings and numbers always serializes
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_shape() {
        let err = OcrError::Http("connection refused".to_string());
        let result = OcrResult::fallback("llm", Some("gpt-4o-mini".into()), &err, Duration::from_millis(42));

        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.engine, FALLBACK_ENGINE);
        assert_eq!(result.processing_time_ms, 42);
        assert!(result.is_fallback());
        assert!(result.text.contains("connection refused"));

        let json = result.to_json();
        assert_eq!(json["error"], "HTTP request failed: connection refused");
        assert_eq!(json["metadata"]["provider"], "llm");
        assert_eq!(json["metadata"]["failed"], true);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let result = OcrResult {
            text: "hello".to_string(),
            confidence: 1.0,
            processing_time_ms: 0,
            engine: "stub".to_string(),
            model: None,
            version: None,
            error: None,
            metadata: None,
        };

        let json = result.to_json();
        assert!(json.get("error").is_none());
        assert!(json.get("model").is_none());

        let parsed: OcrResult = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, result);
    }
}
