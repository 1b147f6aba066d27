//! Image processing for the crop pipeline, in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop** | exact-size RGB surface + `imageops::replace` |
//! | **Encode** | `JpegEncoder` at quality 95 |
//! | **Embed** | base64 `data:` URL |
//!
//! The module is split into:
//! - **Geometry**: pure pan/zoom/rect math (unit testable)
//! - **Parameters**: data structures describing a crop and its result
//! - **Source**: fetch policy and the [`SourceLoader`] seam
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: high-level functions combining the above

pub mod backend;
pub mod geometry;
pub mod operations;
pub mod params;
pub mod rust_backend;
pub mod source;

pub use backend::{BackendError, ImageBackend};
pub use geometry::{Dimensions, PixelRect};
pub use operations::{OperationError, Source, crop, identify};
pub use params::{CROP_MEDIA_TYPE, CROP_QUALITY, CropOutput, CropParams, EncodedImage, Quality};
pub use rust_backend::RustBackend;
pub use source::{FetchPolicy, LoadError, LocalSourceLoader, SourceLoader, fetch_policy};
