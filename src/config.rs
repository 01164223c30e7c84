//! Configuration for scrawl2org
//!
//! All settings are carried in an explicit [`Config`] value that callers pass
//! to the processor and extractor. Nothing here reads global state except
//! [`OcrConfig::with_env_api_key`], which the binary calls on purpose.

use crate::error::{Result, ScrawlError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file name
pub const DEFAULT_DATABASE: &str = "scrawl2org.db";

/// Environment variables consulted for the OCR API key, in order
pub const API_KEY_ENV_VARS: &[&str] = &["SCRAWL2ORG_API_KEY", "OPENAI_API_KEY"];

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SQLite database location
    pub database: PathBuf,

    /// Page rendering settings
    pub render: RenderConfig,

    /// OCR provider selection
    pub ocr: OcrConfig,

    /// Inline display settings used by the extractor
    pub display: DisplayOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            render: RenderConfig::default(),
            ocr: OcrConfig::default(),
            display: DisplayOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file; absent fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrawlError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            ScrawlError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if !(self.render.scale.is_finite() && self.render.scale > 0.0) {
            return Err(ScrawlError::Config(format!(
                "Render scale must be positive, got {}",
                self.render.scale
            )));
        }
        self.display.validate()
    }
}

/// Page rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Scale factor relative to 72 DPI
    pub scale: f32,

    /// Rasteriser executable
    pub renderer_binary: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            renderer_binary: "pdftoppm".to_string(),
        }
    }
}

impl RenderConfig {
    /// Resolution handed to the rasteriser for a render scale (72 DPI at 1.0)
    pub fn dpi_for(scale: f32) -> u32 {
        (72.0 * scale).round().max(1.0) as u32
    }
}

/// Which OCR provider to use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrEngine {
    /// Deterministic placeholder text, no network
    #[default]
    Stub,
    /// OpenAI-compatible vision chat completion
    Llm,
}

impl OcrEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrEngine::Stub => "stub",
            OcrEngine::Llm => "llm",
        }
    }
}

impl std::str::FromStr for OcrEngine {
    type Err = ScrawlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stub" => Ok(OcrEngine::Stub),
            "llm" => Ok(OcrEngine::Llm),
            other => Err(ScrawlError::Config(format!("Unknown OCR engine: {}", other))),
        }
    }
}

impl std::fmt::Display for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OCR configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// Run OCR for pages that are (re)written
    pub enabled: bool,

    /// Provider selection
    pub engine: OcrEngine,

    /// Provider-specific model identifier
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API (e.g. "http://localhost:11434/v1")
    pub api_base: Option<String>,

    /// API key; never serialized back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout for networked providers
    pub timeout_secs: Option<u64>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: OcrEngine::Stub,
            model: None,
            api_base: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl OcrConfig {
    /// Fill a missing API key from the first set variable in [`API_KEY_ENV_VARS`]
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = API_KEY_ENV_VARS
                .iter()
                .find_map(|var| std::env::var(var).ok())
                .filter(|key| !key.is_empty());
        }
        self
    }
}

/// Inline terminal display settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayOptions {
    /// Use inline display even when the terminal is not detected as capable
    pub force_inline: bool,

    /// Never use inline display; write raw bytes instead
    pub disable_inline: bool,

    /// Display width in terminal cells
    pub width: Option<u32>,

    /// Display height in terminal cells
    pub height: Option<u32>,
}

impl DisplayOptions {
    /// Reject mutually exclusive settings
    pub fn validate(&self) -> Result<()> {
        if self.force_inline && self.disable_inline {
            return Err(ScrawlError::ConflictingOptions(
                "Cannot specify both --kitty and --no-kitty".to_string(),
            ));
        }
        Ok(())
    }

    /// Decide whether to display inline given terminal capability
    pub fn use_inline(&self, terminal_supports_inline: bool) -> bool {
        self.force_inline || (terminal_supports_inline && !self.disable_inline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database, PathBuf::from("scrawl2org.db"));
        assert_eq!(RenderConfig::dpi_for(config.render.scale), 144);
        assert!(config.ocr.enabled);
        assert_eq!(config.ocr.engine, OcrEngine::Stub);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"ocr": {{"engine": "llm", "model": "gpt-4o-mini"}}, "render": {{"scale": 1.5}}}}"#
        )
        .unwrap();

        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.ocr.engine, OcrEngine::Llm);
        assert_eq!(config.ocr.model.as_deref(), Some("gpt-4o-mini"));
        assert!(config.ocr.enabled);
        assert_eq!(RenderConfig::dpi_for(config.render.scale), 108);
        assert_eq!(config.render.renderer_binary, "pdftoppm");
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let mut config = Config::default();
        config.render.scale = 0.0;
        assert!(matches!(config.validate(), Err(ScrawlError::Config(_))));
    }

    #[test]
    fn test_engine_parsing() {
        assert_eq!("LLM".parse::<OcrEngine>().unwrap(), OcrEngine::Llm);
        assert_eq!("stub".parse::<OcrEngine>().unwrap(), OcrEngine::Stub);
        assert!("tesseract".parse::<OcrEngine>().is_err());
    }

    #[test]
    fn test_conflicting_display_options() {
        let options = DisplayOptions {
            force_inline: true,
            disable_inline: true,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ScrawlError::ConflictingOptions(_))
        ));
    }

    #[test]
    fn test_use_inline_decision() {
        let default = DisplayOptions::default();
        assert!(default.use_inline(true));
        assert!(!default.use_inline(false));

        let forced = DisplayOptions {
            force_inline: true,
            ..Default::default()
        };
        assert!(forced.use_inline(false));

        let disabled = DisplayOptions {
            disable_inline: true,
            ..Default::default()
        };
        assert!(!disabled.use_inline(true));
    }
}
