//! Shared test utilities for the image-stack test suite.
//!
//! Provides synthetic image bytes, list builders, mock collaborators and a
//! recorder for `on_change` commits.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let list = list_of(&["a", "b", "c"]);
//! assert_eq!(ids(&store::promote_to_cover(&list, 2)), vec!["c", "a", "b"]);
//!
//! let changes = ChangeLog::default();
//! let field = ImageField::new(FieldConfig::default(), changes.sink());
//! ```

use crate::bridge::{CropUploader, UploadError, Uploader};
use crate::imaging::EncodedImage;
use crate::types::{ImageId, ImageList, ImageRecord, SourceFile};
use futures::future::LocalBoxFuture;
use image::{ImageEncoder, Rgb, RgbImage};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// A valid JPEG of the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

fn png_from(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    bytes
}

/// A valid PNG of the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    png_from(&gradient(width, height))
}

/// A PNG whose left half is pure red and right half pure blue.
pub fn split_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    png_from(&img)
}

/// An in-memory JPEG source file.
pub fn jpeg_file(name: &str, width: u32, height: u32) -> SourceFile {
    SourceFile::from_bytes(name, "image/jpeg", jpeg_bytes(width, height))
}

// =========================================================================
// Lists
// =========================================================================

/// Remote records with the given ids and `https://img.test/<id>.jpg` URLs.
pub fn list_of(ids: &[&str]) -> ImageList {
    ids.iter()
        .map(|id| ImageRecord::remote(*id, format!("https://img.test/{id}.jpg")))
        .collect()
}

/// All ids in list order.
pub fn ids(list: &[ImageRecord]) -> Vec<&str> {
    list.iter().map(|r| r.id.as_str()).collect()
}

/// Source file names in list order (`"-"` for remote records).
pub fn names_of(list: &[ImageRecord]) -> Vec<&str> {
    list.iter()
        .map(|r| r.file.as_ref().map_or("-", |f| f.name()))
        .collect()
}

// =========================================================================
// Collaborators
// =========================================================================

/// Uploader returning `<base><file name>` and remembering what it saw.
pub struct RecordingUploader {
    base: String,
    uploaded: RefCell<Vec<String>>,
}

impl RecordingUploader {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            uploaded: RefCell::new(Vec::new()),
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.borrow().clone()
    }
}

impl Uploader for RecordingUploader {
    fn upload<'a>(&'a self, file: &'a SourceFile) -> LocalBoxFuture<'a, Result<String, UploadError>> {
        Box::pin(async move {
            self.uploaded.borrow_mut().push(file.name().to_string());
            Ok(format!("{}{}", self.base, file.name()))
        })
    }
}

/// Uploader that succeeds until call number `fail_on` (0-based), which fails.
pub struct FailingUploader {
    fail_on: usize,
    calls: Cell<usize>,
}

impl FailingUploader {
    pub fn on_call(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Uploader for FailingUploader {
    fn upload<'a>(&'a self, file: &'a SourceFile) -> LocalBoxFuture<'a, Result<String, UploadError>> {
        Box::pin(async move {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call == self.fail_on {
                Err(UploadError::Rejected("storage unavailable".to_string()))
            } else {
                Ok(format!("https://cdn.test/{}", file.name()))
            }
        })
    }
}

/// Uploader that never completes.
pub struct PendingUploader;

impl Uploader for PendingUploader {
    fn upload<'a>(&'a self, _file: &'a SourceFile) -> LocalBoxFuture<'a, Result<String, UploadError>> {
        Box::pin(futures::future::pending())
    }
}

/// Crop uploader returning `https://cdn.test/crops/<id>.jpg`, or failing.
#[derive(Default)]
pub struct MockCropUploader {
    pub fail: bool,
    pub received: RefCell<Vec<(String, u32, u32)>>,
}

impl CropUploader for MockCropUploader {
    fn upload_crop<'a>(
        &'a self,
        id: &'a ImageId,
        image: &'a EncodedImage,
    ) -> LocalBoxFuture<'a, Result<String, UploadError>> {
        Box::pin(async move {
            if self.fail {
                return Err(UploadError::Rejected("crop storage down".to_string()));
            }
            self.received
                .borrow_mut()
                .push((id.to_string(), image.width, image.height));
            Ok(format!("https://cdn.test/crops/{id}.jpg"))
        })
    }
}

// =========================================================================
// Commit recorder
// =========================================================================

/// Records every snapshot handed to `on_change`.
#[derive(Clone, Default)]
pub struct ChangeLog(Rc<RefCell<Vec<ImageList>>>);

impl ChangeLog {
    /// A closure suitable as the field's `on_change`.
    pub fn sink(&self) -> impl Fn(ImageList) + 'static {
        let log = Rc::clone(&self.0);
        move |list| log.borrow_mut().push(list)
    }

    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }

    /// The most recent commit. Panics if nothing was committed.
    pub fn last(&self) -> ImageList {
        self.0
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("on_change was never called"))
    }
}
