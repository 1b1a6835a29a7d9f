//! Inline chart screenshots
//!
//! Live trades carry their screenshots as `data:` URIs. Archives carry the raw
//! bytes as separate files and the trade only keeps the filename.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::ids::TradeUid;

/// MIME type assumed when nothing better is known
pub const DEFAULT_MIME: &str = "image/png";

/// Which side of a trade a screenshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Entry,
    Exit,
}

impl ImageSlot {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }

    /// Derive the archive filename for a trade's screenshot
    pub fn file_name(&self, uid: &TradeUid, extension: &str) -> String {
        format!("{}_{}.{}", self.prefix(), uid, extension)
    }
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Decoded image bytes plus their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    /// Build an image from archive bytes, inferring the MIME type from the name
    pub fn from_file_bytes(file_name: &str, bytes: Vec<u8>) -> Self {
        Self::new(mime_for_file_name(file_name), bytes)
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageError> {
        let rest = uri.strip_prefix("data:").ok_or(ImageError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(ImageError::NotBase64)?;
        let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        Ok(Self::new(mime, bytes))
    }

    /// Encode as a `data:` URI
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// File extension used when archiving this image
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime)
    }
}

/// Infer a MIME type from a filename extension, defaulting to PNG
pub fn mime_for_file_name(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => DEFAULT_MIME,
    }
}

/// Extension for a MIME type, defaulting to `png`
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "image/x-icon" => "ico",
        _ => "png",
    }
}

/// Errors decoding an inline image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    NotDataUri,
    NotBase64,
    Decode(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDataUri => write!(f, "not a data URI"),
            Self::NotBase64 => write!(f, "data URI is not base64 encoded"),
            Self::Decode(e) => write!(f, "invalid base64 payload: {}", e),
        }
    }
}

impl std::error::Error for ImageError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_decode() {
        let image = InlineImage::from_data_uri("data:image/jpeg;base64,AAEC").unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.bytes, vec![0, 1, 2]);
        assert_eq!(image.extension(), "jpg");
        assert_eq!(image.to_data_uri(), "data:image/jpeg;base64,AAEC");
    }

    #[test]
    fn test_rejects_non_data_uri() {
        assert_eq!(
            InlineImage::from_data_uri("entry_trade_1.png"),
            Err(ImageError::NotDataUri)
        );
        assert_eq!(
            InlineImage::from_data_uri("data:image/png,rawtext"),
            Err(ImageError::NotBase64)
        );
    }

    #[test]
    fn test_mime_inference() {
        assert_eq!(mime_for_file_name("entry_x.PNG"), "image/png");
        assert_eq!(mime_for_file_name("entry_x.jpeg"), "image/jpeg");
        assert_eq!(mime_for_file_name("entry_x.tiff"), DEFAULT_MIME);
        assert_eq!(mime_for_file_name("entry_x"), DEFAULT_MIME);
    }

    #[test]
    fn test_slot_file_name() {
        let uid = TradeUid::from_string("trade_42");
        assert_eq!(ImageSlot::Entry.file_name(&uid, "png"), "entry_trade_42.png");
        assert_eq!(ImageSlot::Exit.file_name(&uid, "jpg"), "exit_trade_42.jpg");
    }
}
