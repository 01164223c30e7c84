//! Inline image display via the kitty graphics protocol
//!
//! PNG payloads are base64-encoded and sent as `ESC _G ... ESC \` escape
//! sequences in chunks of at most 4096 bytes.

use base64::{Engine as _, engine::general_purpose};
use std::io::Write;

/// Maximum base64 payload per escape sequence
const CHUNK_SIZE: usize = 4096;

/// Where extracted pages go when no output file is given
pub trait PageSink {
    /// Whether inline display is possible here
    fn supports_inline(&self) -> bool;

    /// Show a page inline
    fn display_inline(&mut self, png: &[u8], width: Option<u32>, height: Option<u32>) -> std::io::Result<()>;

    /// Emit the raw image bytes
    fn write_raw(&mut self, png: &[u8]) -> std::io::Result<()>;
}

/// Standard output, with kitty detection from the environment
#[derive(Debug, Default)]
pub struct TerminalSink;

impl PageSink for TerminalSink {
    fn supports_inline(&self) -> bool {
        KittyDisplay::is_supported()
    }

    fn display_inline(&mut self, png: &[u8], width: Option<u32>, height: Option<u32>) -> std::io::Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        KittyDisplay::write_image(&mut lock, png, width, height)
    }

    fn write_raw(&mut self, png: &[u8]) -> std::io::Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(png)?;
        lock.flush()
    }
}

pub struct KittyDisplay;

impl KittyDisplay {
    /// Probe the real environment
    pub fn is_supported() -> bool {
        Self::is_supported_with(|key| std::env::var(key).ok())
    }

    /// Probe using a custom variable lookup
    pub fn is_supported_with<F>(lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup("TERM").as_deref() == Some("xterm-kitty") || lookup("KITTY_WINDOW_ID").is_some()
    }

    /// Transmit and display a PNG, optionally sized in terminal cells
    pub fn write_image<W: Write>(
        out: &mut W,
        png: &[u8],
        width: Option<u32>,
        height: Option<u32>,
    ) -> std::io::Result<()> {
        let encoded = general_purpose::STANDARD.encode(png);

        let mut params = vec!["a=T".to_string(), "f=100".to_string()];
        if let Some(width) = width.filter(|w| *w > 0) {
            params.push(format!("c={}", width));
        }
        if let Some(height) = height.filter(|h| *h > 0) {
            params.push(format!("r={}", height));
        }
        let params = params.join(",");

        // base64 output is ASCII, so byte chunks are valid str slices
        let chunks: Vec<&str> = encoded
            .as_bytes()
            .chunks(CHUNK_SIZE)
            .map(|c| std::str::from_utf8(c).unwrap_or_default())
            .collect();

        if chunks.len() <= 1 {
            write!(out, "\x1b_G{};{}\x1b\\", params, chunks.first().copied().unwrap_or(""))?;
        } else {
            let last = chunks.len() - 1;
            for (i, chunk) in chunks.iter().enumerate() {
                match i {
                    0 => write!(out, "\x1b_G{},m=1;{}\x1b\\", params, chunk)?,
                    i if i == last => write!(out, "\x1b_Gm=0;{}\x1b\\", chunk)?,
                    _ => write!(out, "\x1b_Gm=1;{}\x1b\\", chunk)?,
                }
            }
        }

        writeln!(out)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(png: &[u8], width: Option<u32>, height: Option<u32>) -> String {
        let mut out = Vec::new();
        KittyDisplay::write_image(&mut out, png, width, height).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_detection() {
        assert!(KittyDisplay::is_supported_with(|k| {
            (k == "TERM").then(|| "xterm-kitty".to_string())
        }));
        assert!(KittyDisplay::is_supported_with(|k| {
            (k == "KITTY_WINDOW_ID").then(|| "1".to_string())
        }));
        assert!(!KittyDisplay::is_supported_with(|k| {
            (k == "TERM").then(|| "xterm-256color".to_string())
        }));
    }

    #[test]
    fn test_single_chunk() {
        let out = render(b"abc", None, None);
        assert_eq!(out, "\x1b_Ga=T,f=100;YWJj\x1b\\\n");
    }

    #[test]
    fn test_size_parameters() {
        let out = render(b"abc", Some(40), Some(20));
        assert!(out.starts_with("\x1b_Ga=T,f=100,c=40,r=20;"));
    }

    #[test]
    fn test_multi_chunk_markers() {
        // 6000 raw bytes -> 8000 base64 chars -> two chunks
        let out = render(&vec![0u8; 6000], None, None);
        let sequences: Vec<&str> = out.trim_end().split("\x1b\\").filter(|s| !s.is_empty()).collect();

        assert_eq!(sequences.len(), 2);
        assert!(sequences[0].starts_with("\x1b_Ga=T,f=100,m=1;"));
        assert!(sequences[1].starts_with("\x1b_Gm=0;"));
    }

    #[test]
    fn test_middle_chunks_continue() {
        // 9000 raw bytes -> 12000 base64 chars -> three chunks
        let out = render(&vec![1u8; 9000], None, None);
        let sequences: Vec<&str> = out.trim_end().split("\x1b\\").filter(|s| !s.is_empty()).collect();

        assert_eq!(sequences.len(), 3);
        assert!(sequences[1].starts_with("\x1b_Gm=1;"));
        assert!(sequences[2].starts_with("\x1b_Gm=0;"));
    }
}
