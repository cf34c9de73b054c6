//! Local image assets queued for upload.

use std::fmt;

/// A local image handle: raw bytes plus naming metadata.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// File name submitted to the blob store, with the extension normalized
    /// (`.jpeg` becomes `.jpg`).
    #[must_use]
    pub fn upload_file_name(&self) -> String {
        normalize_extension(&self.file_name)
    }

    /// Effective MIME type: the supplied one unless it is empty or the
    /// generic octet-stream, otherwise a lookup from the file extension.
    #[must_use]
    pub fn resolved_mime_type(&self) -> String {
        let supplied = self.mime_type.trim();
        if !supplied.is_empty() && !supplied.eq_ignore_ascii_case("application/octet-stream") {
            return supplied.to_string();
        }

        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ImageAsset")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .finish()
    }
}

fn normalize_extension(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();
    lowered.strip_suffix(".jpeg").map_or_else(
        || name.to_string(),
        |_| format!("{}.jpg", &name[..name.len() - ".jpeg".len()]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_jpeg_extension() {
        let asset = ImageAsset::new("holiday.jpeg", "image/jpeg", vec![1]);
        assert_eq!(asset.upload_file_name(), "holiday.jpg");

        let shouting = ImageAsset::new("HOLIDAY.JPEG", "image/jpeg", vec![1]);
        assert_eq!(shouting.upload_file_name(), "HOLIDAY.jpg");
    }

    #[test]
    fn leaves_other_extensions_alone() {
        let asset = ImageAsset::new("receipt.png", "image/png", vec![1]);
        assert_eq!(asset.upload_file_name(), "receipt.png");
    }

    #[test]
    fn resolved_mime_prefers_supplied_value() {
        let asset = ImageAsset::new("photo.png", "image/webp", vec![1]);
        assert_eq!(asset.resolved_mime_type(), "image/webp");
    }

    #[test]
    fn resolved_mime_falls_back_to_extension_lookup() {
        let empty = ImageAsset::new("photo.png", "", vec![1]);
        assert_eq!(empty.resolved_mime_type(), "image/png");

        let generic = ImageAsset::new("photo.jpg", "application/octet-stream", vec![1]);
        assert_eq!(generic.resolved_mime_type(), "image/jpeg");
    }

    #[test]
    fn debug_omits_raw_bytes() {
        let asset = ImageAsset::new("photo.png", "image/png", vec![0; 512]);
        let rendered = format!("{asset:?}");
        assert!(rendered.contains("512 bytes"));
        assert!(!rendered.contains("[0"));
    }
}
