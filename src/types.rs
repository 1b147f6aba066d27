//! Shared types used across intake, crop and the list store.
//!
//! [`ImageRecord`] is the only shape that crosses the component boundary:
//! it serializes as `{ "id": ..., "url": ... }`. The optional [`SourceFile`]
//! handle never survives serialization; callers that need durable URLs must
//! supply an uploader (see [`bridge`](crate::bridge)).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Ordered collection of image records. Position 0 is the cover.
pub type ImageList = Vec<ImageRecord>;

/// Opaque record identifier.
///
/// Generated identifiers are random UUID v4 strings (122 random bits), so
/// two intake batches never produce the same id in practice. Identifiers of
/// pre-existing records supplied by the caller are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One image in the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    /// Embedded `data:` URL or a caller-assigned locator. Replaced wholesale
    /// when a crop completes.
    pub url: String,
    /// Original payload for locally added images. Absent for records that
    /// came in as remote URLs.
    #[serde(skip)]
    pub file: Option<SourceFile>,
}

impl ImageRecord {
    /// A record for an image that already lives at `url` (no local payload).
    pub fn remote(id: impl Into<ImageId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            file: None,
        }
    }
}

/// Where the bytes of a [`SourceFile`] live.
#[derive(Clone, PartialEq)]
enum Contents {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

/// A file as selected by the user: name, declared media type and size are
/// known up front, the contents are read only when the file is resolved.
#[derive(Clone, PartialEq)]
pub struct SourceFile {
    name: String,
    media_type: String,
    size: u64,
    contents: Contents,
}

impl SourceFile {
    /// An in-memory file (drag-and-drop payloads, tests).
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes: Arc<[u8]> = bytes.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            contents: Contents::Memory(bytes),
        }
    }

    /// A file on disk. Only its metadata is read here; the declared media
    /// type comes from the extension, like a browser file picker reports it.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            media_type: media_type_for_path(path).to_string(),
            size: meta.len(),
            contents: Contents::Path(path.to_path_buf()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Byte size as declared at selection time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the full contents.
    pub fn read(&self) -> io::Result<Arc<[u8]>> {
        match &self.contents {
            Contents::Memory(bytes) => Ok(Arc::clone(bytes)),
            Contents::Path(path) => Ok(std::fs::read(path)?.into()),
        }
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match &self.contents {
            Contents::Memory(_) => "memory".to_string(),
            Contents::Path(path) => path.display().to_string(),
        };
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.size)
            .field("contents", &location)
            .finish()
    }
}

/// Extension → media type table used when files come from disk.
const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
];

/// Media type for a path's extension, `application/octet-stream` if unknown.
pub fn media_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| {
            MEDIA_TYPES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, mime)| *mime)
        })
        .unwrap_or("application/octet-stream")
}
