//! Image format tags used to pick a codec.
//!
//! Formats are resolved from the file extension first; files with a missing
//! or unfamiliar extension fall back to sniffing their leading bytes.

use crate::error::{CompressionError, Result};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const RIFF_TAG: &[u8] = b"RIFF";
const WEBP_TAG: &[u8] = b"WEBP";

/// Number of leading bytes needed to recognise every supported signature.
pub const SIGNATURE_LEN: usize = 12;

/// Formats the default codec registry knows how to compress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecFormat {
    /// Lossy JPEG, quality driven
    Jpeg,
    /// Lossless PNG, optimised with oxipng
    Png,
    /// Lossless WebP
    WebP,
}

impl CodecFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CodecFormat::Jpeg => "jpg",
            CodecFormat::Png => "png",
            CodecFormat::WebP => "webp",
        }
    }

    /// Lowercase tag used as the codec registry key
    pub fn tag(&self) -> &'static str {
        match self {
            CodecFormat::Jpeg => "jpeg",
            CodecFormat::Png => "png",
            CodecFormat::WebP => "webp",
        }
    }

    pub fn from_path(path: &Path) -> Option<CodecFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| CodecFormat::from_str(ext).ok())
    }

    /// Recognises JPEG, PNG and WebP by their magic bytes.
    pub fn from_signature(data: &[u8]) -> Option<CodecFormat> {
        if data.starts_with(JPEG_SIGNATURE) {
            Some(CodecFormat::Jpeg)
        } else if data.starts_with(PNG_SIGNATURE) {
            Some(CodecFormat::Png)
        } else if data.len() >= SIGNATURE_LEN
            && data.starts_with(RIFF_TAG)
            && &data[8..12] == WEBP_TAG
        {
            Some(CodecFormat::WebP)
        } else {
            None
        }
    }
}

impl fmt::Display for CodecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecFormat::Jpeg => "JPEG",
            CodecFormat::Png => "PNG",
            CodecFormat::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CodecFormat {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(CodecFormat::Jpeg),
            "png" => Ok(CodecFormat::Png),
            "webp" => Ok(CodecFormat::WebP),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}
