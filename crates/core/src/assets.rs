//! Embedded image helpers for callers that inline assets into a section.
//!
//! The engine does not enforce these limits. Callers check before writing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::document::SiteConfig;

/// Largest raw image accepted for embedding. The encoded form is about 4/3
/// of this.
pub const MAX_IMAGE_BYTES: usize = 800 * 1024;

/// Largest document the store accepts.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("unsupported media type")]
    UnsupportedMediaType,

    #[error("document could not be measured: {0}")]
    Unmeasurable(String),
}

/// Identify an image by its leading bytes.
pub fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Fail with `PayloadTooLarge` when `size` exceeds `limit`.
pub fn check_size(size: usize, limit: usize) -> Result<(), AssetError> {
    if size > limit {
        return Err(AssetError::PayloadTooLarge { size, limit });
    }
    Ok(())
}

/// Encode an image as a `data:` URL suitable for an image field.
pub fn image_data_url(bytes: &[u8]) -> Result<String, AssetError> {
    check_size(bytes.len(), MAX_IMAGE_BYTES)?;
    let mime = sniff_image_type(bytes).ok_or(AssetError::UnsupportedMediaType)?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Check that the full document still fits the store's limit.
pub fn check_document_size(config: &SiteConfig) -> Result<usize, AssetError> {
    let size = config
        .encoded_len()
        .map_err(|err| AssetError::Unmeasurable(err.to_string()))?;
    check_size(size, MAX_DOCUMENT_BYTES)?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::default_site_config;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn png_becomes_data_url() {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);

        let url = image_data_url(&bytes).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        let encoded = url.trim_start_matches("data:image/png;base64,");
        assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
    }

    #[test]
    fn oversized_image_is_rejected_before_encoding() {
        let mut bytes = vec![0xFF, 0xD8, 0xFF];
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        assert_eq!(
            image_data_url(&bytes),
            Err(AssetError::PayloadTooLarge {
                size: MAX_IMAGE_BYTES + 1,
                limit: MAX_IMAGE_BYTES
            })
        );
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        assert_eq!(image_data_url(b"plain text"), Err(AssetError::UnsupportedMediaType));
        assert_eq!(sniff_image_type(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
    }

    #[test]
    fn document_size_limit() {
        let mut config = default_site_config();
        assert!(check_document_size(&config).unwrap() < MAX_DOCUMENT_BYTES);

        config.set_section("hero", json!({ "image": "x".repeat(MAX_DOCUMENT_BYTES) }));
        assert!(matches!(
            check_document_size(&config),
            Err(AssetError::PayloadTooLarge { .. })
        ));
    }
}
