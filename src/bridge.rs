//! Bytes ↔ displayable URL.
//!
//! By default a file becomes a self-contained `data:<mime>;base64,...` URL.
//! When the caller supplies an [`Uploader`], the file is handed to it instead
//! and whatever locator it returns is used verbatim.
//!
//! The collaborator traits return [`LocalBoxFuture`]: every caller-supplied
//! operation runs on the single UI task, so nothing here requires `Send`.

use crate::imaging::EncodedImage;
use crate::types::{ImageId, SourceFile};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::LocalBoxFuture;
use thiserror::Error;

/// Failure reported by a caller-supplied upload function.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Caller-supplied upload for newly selected files.
pub trait Uploader {
    /// Store `file` somewhere durable and return its URL.
    fn upload<'a>(&'a self, file: &'a SourceFile) -> LocalBoxFuture<'a, Result<String, UploadError>>;
}

/// Caller-supplied upload for crop results.
pub trait CropUploader {
    fn upload_crop<'a>(
        &'a self,
        id: &'a ImageId,
        image: &'a EncodedImage,
    ) -> LocalBoxFuture<'a, Result<String, UploadError>>;
}

/// Failure while turning a file into a URL.
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Failed to read {file}: {source}")]
    Read {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Upload of {file} failed: {source}")]
    Upload {
        file: String,
        #[source]
        source: UploadError,
    },
}

/// Resolve `file` to a URL: through `uploader` when given, otherwise as an
/// embedded data URL. The returned locator is not inspected.
///
/// The embed path reads path-backed files with blocking `std::fs` I/O on
/// the calling task, so a large file on slow storage holds up the UI task
/// until it is read. Files handed over as bytes (drops, pickers) are never
/// touched on disk. Callers that need the read off the UI task should supply
/// an [`Uploader`] that does it elsewhere.
pub async fn to_displayable(
    file: &SourceFile,
    uploader: Option<&dyn Uploader>,
) -> Result<String, ProcessingError> {
    match uploader {
        Some(uploader) => uploader
            .upload(file)
            .await
            .map_err(|source| ProcessingError::Upload {
                file: file.name().to_string(),
                source,
            }),
        None => {
            let bytes = file.read().map_err(|source| ProcessingError::Read {
                file: file.name().to_string(),
                source,
            })?;
            Ok(to_data_url(file.media_type(), &bytes))
        }
    }
}

/// Encode bytes as a `data:` URL.
pub fn to_data_url(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", BASE64.encode(bytes))
}

/// Whether `url` is an embedded representation rather than a locator.
pub fn is_embedded(url: &str) -> bool {
    url.starts_with("data:") || url.starts_with("blob:")
}

#[derive(Error, Debug, PartialEq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("data URL is missing the ',' separator")]
    MissingSeparator,
    #[error("only base64 data URLs are supported")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<DataUrl, DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(DataUrlError::MissingSeparator)?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or(DataUrlError::NotBase64)?;
    let bytes = BASE64.decode(payload.trim())?;
    Ok(DataUrl {
        media_type: media_type.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingUploader, RecordingUploader};
    use futures::executor::block_on;

    #[test]
    fn embeds_file_as_data_url() {
        let file = SourceFile::from_bytes("a.png", "image/png", vec![1u8, 2, 3]);
        let url = block_on(to_displayable(&file, None)).unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
    }

    #[test]
    fn uploader_overrides_embedding() {
        let uploader = RecordingUploader::new("https://cdn.example.com/");
        let file = SourceFile::from_bytes("a.png", "image/png", vec![1u8, 2, 3]);
        let url = block_on(to_displayable(&file, Some(&uploader))).unwrap();
        assert_eq!(url, "https://cdn.example.com/a.png");
        assert_eq!(uploader.uploaded(), vec!["a.png"]);
    }

    #[test]
    fn uploader_failure_propagates() {
        let uploader = FailingUploader::on_call(0);
        let file = SourceFile::from_bytes("a.png", "image/png", vec![1u8]);
        let err = block_on(to_displayable(&file, Some(&uploader))).unwrap_err();
        assert!(matches!(err, ProcessingError::Upload { ref file, .. } if file == "a.png"));
    }

    #[test]
    fn read_failure_propagates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("gone.jpg");
        std::fs::write(&path, [0u8; 4]).unwrap();
        let file = SourceFile::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = block_on(to_displayable(&file, None)).unwrap_err();
        assert!(matches!(err, ProcessingError::Read { .. }));
    }

    #[test]
    fn data_url_decodes_back() {
        let url = to_data_url("image/jpeg", b"hello");
        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.media_type, "image/jpeg");
        assert_eq!(decoded.bytes, b"hello");
    }

    #[test]
    fn data_url_errors() {
        assert_eq!(
            decode_data_url("https://x/y.png"),
            Err(DataUrlError::NotDataUrl)
        );
        assert_eq!(
            decode_data_url("data:image/png;base64"),
            Err(DataUrlError::MissingSeparator)
        );
        assert_eq!(
            decode_data_url("data:text/plain,hello"),
            Err(DataUrlError::NotBase64)
        );
        assert!(matches!(
            decode_data_url("data:image/png;base64,!!!"),
            Err(DataUrlError::Base64(_))
        ));
    }

    #[test]
    fn embedded_detection() {
        assert!(is_embedded("data:image/png;base64,AA=="));
        assert!(is_embedded("blob:https://app/1234"));
        assert!(!is_embedded("/uploads/a.png"));
    }
}
