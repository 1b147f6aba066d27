//! Pure Rust crop backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF) | `image::ImageReader` with format sniffing |
//! | Identify | `ImageReader::into_dimensions` (header only) |
//! | Blit | `image::imageops::crop_imm` + `image::imageops::replace` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, ImageBackend};
use super::geometry::Dimensions;
use super::params::{CROP_MEDIA_TYPE, CropParams, EncodedImage};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, RgbImage, imageops};
use std::io::Cursor;

/// Largest surface we agree to allocate, in pixels (browser canvas limit).
const MAX_SURFACE_PIXELS: u64 = 268_435_456;

/// Crop backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn reader(source: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

fn decode(source: &[u8]) -> Result<DynamicImage, BackendError> {
    reader(source)?
        .decode()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

/// Allocate the destination surface, refusing empty or oversized ones.
fn allocate_surface(width: u32, height: u32) -> Result<RgbImage, BackendError> {
    let pixels = width as u64 * height as u64;
    if pixels == 0 || pixels > MAX_SURFACE_PIXELS {
        return Err(BackendError::Surface { width, height });
    }
    Ok(RgbImage::new(width, height))
}

fn encode_jpeg(surface: RgbImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    DynamicImage::ImageRgb8(surface)
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(BackendError::Encode("encoder produced no data".to_string()));
    }
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = reader(source)?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn crop(&self, params: &CropParams) -> Result<EncodedImage, BackendError> {
        let rect = params.rect;
        let mut surface = allocate_surface(rect.width, rect.height)?;

        let src = decode(&params.source)?.to_rgb8();
        let dims = Dimensions {
            width: src.width(),
            height: src.height(),
        };

        // Parts of the rect outside the source stay black
        let (x, y, w, h) = rect.intersect(dims);
        if w > 0 && h > 0 {
            let region = imageops::crop_imm(&src, x, y, w, h).to_image();
            imageops::replace(&mut surface, &region, 0, 0);
        }

        let quality = params.quality.value() as u8;
        let bytes = encode_jpeg(surface, quality)?;
        Ok(EncodedImage {
            bytes,
            media_type: CROP_MEDIA_TYPE,
            width: rect.width,
            height: rect.height,
        })
    }
}
