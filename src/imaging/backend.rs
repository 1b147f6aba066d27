//! Image processing backend trait and shared error type.
//!
//! The [`ImageBackend`] trait defines the two operations the crop pipeline
//! needs from pixel code: identify and crop. The production implementation
//! is [`RustBackend`](super::rust_backend::RustBackend).

use super::geometry::Dimensions;
use super::params::{CropParams, EncodedImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),
    #[error("Cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Decode just enough of `source` to learn its dimensions.
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode `params.source`, copy `params.rect` onto a surface of exactly
    /// that size and encode the result.
    fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError>;
}
