//! High-level image operations.
//!
//! These functions combine source loading, the backend's pixel work and the
//! optional re-embedding of the result. A failure at any step leaves nothing
//! behind: the caller only ever sees a finished artifact or an error.

use super::backend::{BackendError, ImageBackend};
use super::geometry::{Dimensions, PixelRect};
use super::params::{CROP_QUALITY, CropOutput, CropParams};
use super::source::{FetchPolicy, LoadError, SourceLoader, fetch_policy};
use crate::bridge::to_data_url;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Where a crop source comes from and how to fetch it.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub url: &'a str,
    pub policy: FetchPolicy,
}

impl<'a> Source<'a> {
    /// Classify `url` against the configured local-upload prefixes.
    pub fn classify(url: &'a str, local_upload_prefixes: &[String]) -> Self {
        Self {
            url,
            policy: fetch_policy(url, local_upload_prefixes),
        }
    }
}

async fn load(loader: &dyn SourceLoader, source: Source<'_>) -> Result<Arc<[u8]>> {
    log::debug!("loading crop source ({:?})", source.policy);
    Ok(loader.load(source.url, source.policy).await?)
}

/// Load a source and report its pixel dimensions.
pub async fn identify(
    loader: &dyn SourceLoader,
    backend: &dyn ImageBackend,
    source: Source<'_>,
) -> Result<Dimensions> {
    let bytes = load(loader, source).await?;
    Ok(backend.identify(&bytes)?)
}

/// Crop `rect` out of the image at `source` and encode it as JPEG at the
/// fixed crop quality.
///
/// With `embedded` set the artifact comes back as a data URL instead of
/// raw bytes.
pub async fn crop(
    loader: &dyn SourceLoader,
    backend: &dyn ImageBackend,
    source: Source<'_>,
    rect: PixelRect,
    embedded: bool,
) -> Result<CropOutput> {
    let bytes = load(loader, source).await?;
    log::debug!(
        "cropping {}x{} at ({}, {})",
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    let image = backend.crop(&CropParams {
        source: bytes,
        rect,
        quality: CROP_QUALITY,
    })?;
    Ok(if embedded {
        CropOutput::Embedded(to_data_url(image.media_type, &image.bytes))
    } else {
        CropOutput::Binary(image)
    })
}
