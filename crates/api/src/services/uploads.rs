//! Product image uploads.
//!
//! Only JPEG, PNG, and WebP are accepted. The file name's extension and the
//! leading magic bytes must agree; the stored name is a fresh UUID so
//! client-supplied names never reach the filesystem.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::UploadConfig;

/// Public URL prefix the upload directory is served under.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Image upload failures.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no image file in request")]
    MissingFile,

    #[error("images only: jpg, jpeg, png or webp")]
    UnsupportedType,

    #[error("file contents do not match its extension")]
    ContentMismatch,

    #[error("image exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
}

impl ImageKind {
    /// Format implied by a file name's extension.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Format identified by the leading bytes of the file.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

/// Where an accepted upload was stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    /// URL path to store on the product, e.g. `/uploads/<uuid>.png`.
    pub image: String,
    pub size: usize,
}

/// Check an upload without touching the filesystem.
///
/// # Errors
///
/// See [`UploadError`].
pub fn validate_image(
    config: &UploadConfig,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<ImageKind, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::MissingFile);
    }
    if bytes.len() > config.max_bytes {
        return Err(UploadError::TooLarge {
            max: config.max_bytes,
        });
    }
    let claimed = file_name
        .and_then(ImageKind::from_file_name)
        .ok_or(UploadError::UnsupportedType)?;
    match ImageKind::sniff(bytes) {
        Some(actual) if actual == claimed => Ok(claimed),
        Some(_) => Err(UploadError::ContentMismatch),
        None => Err(UploadError::UnsupportedType),
    }
}

/// Validate and write an uploaded image to the upload directory.
///
/// # Errors
///
/// See [`UploadError`].
pub async fn store_image(
    config: &UploadConfig,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<StoredImage, UploadError> {
    let kind = validate_image(config, file_name, bytes)?;

    tokio::fs::create_dir_all(&config.dir).await?;
    let stored_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
    tokio::fs::write(config.dir.join(&stored_name), bytes).await?;

    info!(file = %stored_name, size = bytes.len(), "Stored product image");
    Ok(StoredImage {
        image: format!("{UPLOADS_PREFIX}/{stored_name}"),
        size: bytes.len(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 16];
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    fn config() -> UploadConfig {
        UploadConfig {
            dir: std::env::temp_dir().join(format!("bazaar-upload-{}", Uuid::new_v4())),
            max_bytes: 64,
        }
    }

    #[test]
    fn test_sniff() {
        assert_eq!(ImageKind::sniff(PNG), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(JPEG), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(WEBP), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"GIF89a"), None);
    }

    #[test]
    fn test_extension_must_match_contents() {
        let config = config();
        assert_eq!(
            validate_image(&config, Some("Photo.JPEG"), JPEG).unwrap(),
            ImageKind::Jpeg
        );
        assert!(matches!(
            validate_image(&config, Some("photo.png"), JPEG),
            Err(UploadError::ContentMismatch)
        ));
        assert!(matches!(
            validate_image(&config, Some("photo.gif"), b"GIF89a"),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate_image(&config, None, PNG),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_size_limits() {
        let config = config();
        assert!(matches!(
            validate_image(&config, Some("a.png"), &[]),
            Err(UploadError::MissingFile)
        ));
        let mut big = PNG.to_vec();
        big.resize(65, 0);
        assert!(matches!(
            validate_image(&config, Some("a.png"), &big),
            Err(UploadError::TooLarge { max: 64 })
        ));
    }

    #[tokio::test]
    async fn test_store_image_renames_file() {
        let config = config();
        let stored = store_image(&config, Some("../../etc/passwd.png"), PNG)
            .await
            .unwrap();

        assert!(stored.image.starts_with("/uploads/"));
        assert!(stored.image.ends_with(".png"));
        assert!(!stored.image.contains(".."));

        let name = stored.image.trim_start_matches("/uploads/");
        let written = tokio::fs::read(config.dir.join(name)).await.unwrap();
        assert_eq!(written, PNG);
        tokio::fs::remove_dir_all(&config.dir).await.unwrap();
    }
}
