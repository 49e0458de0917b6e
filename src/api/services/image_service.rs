//! Image upload handling.
//!
//! Uploads arrive inline as `data:image/...;base64,` strings. The payload is
//! decoded, the format sniffed from the magic bytes, and the file written
//! under the media root with a UUID name. The database only ever stores the
//! path relative to the media root.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageFormat;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("expected a base64 image data URI")]
    NotDataUri,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported or unrecognized image data")]
    InvalidImage,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes and removes uploaded images under the media root.
pub struct ImageService {
    media_root: PathBuf,
}

impl ImageService {
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    /// Decode a data URI and persist it under `subdir` (e.g. "recipes").
    /// Returns the stored path relative to the media root.
    pub fn save_data_uri(&self, data: &str, subdir: &str) -> Result<String, ImageError> {
        let bytes = decode_data_uri(data)?;
        let extension = sniff_extension(&bytes)?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = self.media_root.join(subdir);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(&file_name), &bytes)?;

        Ok(format!("{}/{}", subdir, file_name))
    }

    /// Remove a stored file. Missing files are not an error; anything else
    /// is logged and swallowed so cleanup never fails a request.
    pub fn remove(&self, relative: &str) {
        let path = self.media_root.join(relative);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove media file {:?}: {}", path, e);
            }
        }
    }
}

/// Decode the payload of a `data:image/...;base64,` URI.
pub fn decode_data_uri(data: &str) -> Result<Vec<u8>, ImageError> {
    let rest = data.strip_prefix("data:image/").ok_or(ImageError::NotDataUri)?;
    let (_, payload) = rest.split_once(";base64,").ok_or(ImageError::NotDataUri)?;
    Ok(BASE64.decode(payload.trim())?)
}

/// Sniff the image format from magic bytes and map it to a file extension.
/// The declared MIME type in the data URI is ignored; the bytes decide.
fn sniff_extension(bytes: &[u8]) -> Result<&'static str, ImageError> {
    match image::guess_format(bytes).map_err(|_| ImageError::InvalidImage)? {
        ImageFormat::Png => Ok("png"),
        ImageFormat::Jpeg => Ok("jpg"),
        ImageFormat::Gif => Ok("gif"),
        ImageFormat::WebP => Ok("webp"),
        _ => Err(ImageError::InvalidImage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_data_uri() {
        let bytes = decode_data_uri(PNG_DATA_URI).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_rejects_non_data_uri() {
        assert!(matches!(
            decode_data_uri("just a string"),
            Err(ImageError::NotDataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:text/plain;base64,aGVsbG8="),
            Err(ImageError::NotDataUri)
        ));
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,!!not-base64!!"),
            Err(ImageError::Base64(_))
        ));
    }

    #[test]
    fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImageService::new(dir.path());

        let relative = service.save_data_uri(PNG_DATA_URI, "recipes").unwrap();
        assert!(relative.starts_with("recipes/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());

        service.remove(&relative);
        assert!(!dir.path().join(&relative).exists());
        // Removing twice is fine
        service.remove(&relative);
    }

    #[test]
    fn test_rejects_non_image_payload() {
        let dir = tempfile::tempdir().unwrap();
        let service = ImageService::new(dir.path());

        let not_an_image = format!("data:image/png;base64,{}", BASE64.encode(b"plain text"));
        assert!(matches!(
            service.save_data_uri(&not_an_image, "recipes"),
            Err(ImageError::InvalidImage)
        ));
    }
}
