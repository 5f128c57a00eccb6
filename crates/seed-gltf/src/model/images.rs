//! In-memory image content.

use std::fmt;
use std::sync::Arc;

/// Encoded image formats recognized from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG / JFIF.
    Jpeg,
    /// Khronos texture container, version 2.
    Ktx2,
    /// DirectDraw surface.
    Dds,
    /// WebP (RIFF container).
    Webp,
}

impl ImageFormat {
    /// Identify a format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
        const KTX2: &[u8] = &[
            0xAB, b'K', b'T', b'X', b' ', b'2', b'0', 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
        ];
        const DDS: &[u8] = b"DDS ";

        if bytes.starts_with(PNG) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(KTX2) {
            Some(ImageFormat::Ktx2)
        } else if bytes.starts_with(DDS) {
            Some(ImageFormat::Dds)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    /// Look a format up by MIME type.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" => Some(ImageFormat::Jpeg),
            "image/ktx2" => Some(ImageFormat::Ktx2),
            "image/vnd-ms.dds" => Some(ImageFormat::Dds),
            "image/webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }

    /// MIME type written to `image.mimeType` and data URIs.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Ktx2 => "image/ktx2",
            ImageFormat::Dds => "image/vnd-ms.dds",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// File extension used for satellite files.
    pub fn file_extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Ktx2 => "ktx2",
            ImageFormat::Dds => "dds",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Encoded image bytes held by the model.
///
/// The bytes are never decoded; the format is sniffed from the content, with
/// the declared MIME type as a fallback for formats the sniffer misses.
#[derive(Clone, PartialEq)]
pub struct MemoryImage {
    bytes: Arc<[u8]>,
    format: Option<ImageFormat>,
    source_path: Option<String>,
}

impl MemoryImage {
    /// Wrap encoded bytes, sniffing their format.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let format = ImageFormat::sniff(&bytes);
        Self {
            bytes,
            format,
            source_path: None,
        }
    }

    /// Wrap encoded bytes, falling back to `mime_type` when sniffing fails.
    pub fn with_mime_type(bytes: impl Into<Arc<[u8]>>, mime_type: Option<&str>) -> Self {
        let mut image = Self::new(bytes);
        if image.format.is_none() {
            image.format = mime_type.and_then(ImageFormat::from_mime_type);
        }
        image
    }

    /// Remember where the bytes came from.
    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Detected format, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// MIME type of the content, `application/octet-stream` when unknown.
    pub fn mime_type(&self) -> &'static str {
        self.format
            .map(ImageFormat::mime_type)
            .unwrap_or("application/octet-stream")
    }

    /// File extension for the content, `bin` when unknown.
    pub fn file_extension(&self) -> &'static str {
        self.format.map(ImageFormat::file_extension).unwrap_or("bin")
    }

    /// Path the image was loaded from, if it came from a satellite file.
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// True when the image holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True when the bytes are in a format glTF core or a common extension accepts.
    pub fn is_valid(&self) -> bool {
        !self.is_empty() && self.format.is_some()
    }
}

impl fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImage")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .field("source_path", &self.source_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_formats() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(ImageFormat::sniff(&png), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::sniff(b"DDS |...."), Some(ImageFormat::Dds));
        assert_eq!(ImageFormat::sniff(b"RIFF\x10\0\0\0WEBPVP8 "), Some(ImageFormat::Webp));
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
    }

    #[test]
    fn test_mime_fallback() {
        let image = MemoryImage::with_mime_type(vec![1u8, 2, 3], Some("image/webp"));
        assert_eq!(image.format(), Some(ImageFormat::Webp));
        assert_eq!(image.file_extension(), "webp");

        let unknown = MemoryImage::new(vec![1u8, 2, 3]);
        assert_eq!(unknown.mime_type(), "application/octet-stream");
        assert!(!unknown.is_valid());
    }
}
