//! Parameter and result types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which decides what to crop, and the
//! [`backend`](super::backend), which does the pixel work.

use super::geometry::PixelRect;
use std::sync::Arc;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Crop results are always encoded at this quality.
pub const CROP_QUALITY: Quality = Quality(95);

/// Media type of every crop result.
pub const CROP_MEDIA_TYPE: &str = "image/jpeg";

/// Everything one crop needs: source bytes, region, encoding quality.
#[derive(Debug, Clone, PartialEq)]
pub struct CropParams {
    pub source: Arc<[u8]>,
    pub rect: PixelRect,
    pub quality: Quality,
}

/// An encoded image artifact.
#[derive(Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("bytes", &self.bytes.len())
            .field("media_type", &self.media_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// What a crop hands back: the binary artifact, or the same artifact as an
/// embedded data URL.
#[derive(Debug, Clone, PartialEq)]
pub enum CropOutput {
    Binary(EncodedImage),
    Embedded(String),
}
