//! The image field: a controlled component over an externally owned list.
//!
//! The field never stores the image list. Every operation takes the
//! snapshot the owner last rendered and, when it changes something, hands
//! the complete next snapshot to `on_change` exactly once. Operations that
//! change nothing (promoting the cover, moving an image onto itself, a
//! batch that adds nothing) do not call `on_change` at all.
//!
//! ## Collaborators
//!
//! | Slot | Default | Purpose |
//! |------|---------|---------|
//! | [`Uploader`] | none: files are embedded as data URLs | durable URLs for new files |
//! | [`CropUploader`] | none: crops are embedded as data URLs | durable URLs for crops |
//! | [`SourceLoader`] | [`LocalSourceLoader`] rooted at `.` | fetch crop sources |
//! | [`ImageBackend`] | [`RustBackend`] | decode, crop, encode |
//!
//! ## Notices
//!
//! Outcomes a user should see are sent as [`Notice`]s on the channel given
//! to [`ImageField::with_notices`]. Failures never escape as panics or
//! leave the list half-updated: a failed batch or crop leaves the owner's
//! snapshot exactly as it was.

use crate::bridge::{CropUploader, UploadError, Uploader, to_data_url};
use crate::config::FieldConfig;
use crate::imaging::{
    CropOutput, ImageBackend, LocalSourceLoader, OperationError, RustBackend, Source,
    SourceLoader, operations,
};
use crate::intake::{Intake, IntakeOutcome, IntakeState};
use crate::output::{Notice, cover_label};
use crate::session::{CropSession, PreviewSession};
use crate::store;
use crate::types::{ImageId, ImageList, ImageRecord, SourceFile};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Cropping is disabled")]
    Disabled,
    #[error("Image {0} is no longer in the list")]
    NotFound(ImageId),
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("Upload of cropped image failed: {0}")]
    Upload(#[from] UploadError),
}

pub struct ImageField {
    config: FieldConfig,
    on_change: Box<dyn Fn(ImageList)>,
    uploader: Option<Box<dyn Uploader>>,
    crop_uploader: Option<Box<dyn CropUploader>>,
    loader: Box<dyn SourceLoader>,
    backend: Box<dyn ImageBackend>,
    notices: Option<Sender<Notice>>,
    intake: Intake,
}

impl ImageField {
    /// A field over `config`, committing through `on_change`.
    ///
    /// `on_change` may call back into the field; the nested commit is
    /// delivered before the outer one returns. `config` is expected to have
    /// passed [`FieldConfig::validate`]; a crop zoom range that has not is
    /// pulled into `1.0..` when a crop dialog opens.
    pub fn new(config: FieldConfig, on_change: impl Fn(ImageList) + 'static) -> Self {
        Self {
            config,
            on_change: Box::new(on_change),
            uploader: None,
            crop_uploader: None,
            loader: Box::new(LocalSourceLoader::new(".")),
            backend: Box::new(RustBackend::new()),
            notices: None,
            intake: Intake::new(),
        }
    }

    pub fn with_uploader(mut self, uploader: impl Uploader + 'static) -> Self {
        self.uploader = Some(Box::new(uploader));
        self
    }

    pub fn with_crop_uploader(mut self, uploader: impl CropUploader + 'static) -> Self {
        self.crop_uploader = Some(Box::new(uploader));
        self
    }

    pub fn with_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_backend(mut self, backend: impl ImageBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    pub fn with_notices(mut self, notices: Sender<Notice>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// `Processing` while a batch is resolving; the UI disables intake then.
    pub fn intake_state(&self) -> IntakeState {
        self.intake.state()
    }

    fn commit(&self, next: ImageList) {
        log::debug!("committing {} image(s)", next.len());
        (self.on_change)(next);
    }

    fn notify(&self, notice: Notice) {
        if let Some(tx) = &self.notices {
            tx.send(notice).ok();
        }
    }

    // =========================================================================
    // Intake
    // =========================================================================

    /// Validate and resolve a batch of newly selected files, committing the
    /// accepted ones in one step.
    pub async fn add_files(&self, images: &[ImageRecord], files: Vec<SourceFile>) -> IntakeOutcome {
        let outcome = self
            .intake
            .run(images, files, &self.config.images, self.uploader.as_deref())
            .await;
        if let IntakeOutcome::Committed { list, .. } = &outcome {
            self.commit(list.clone());
        }
        for notice in Notice::for_intake(&outcome) {
            self.notify(notice);
        }
        outcome
    }

    // =========================================================================
    // List edits
    // =========================================================================

    /// Remove the image at `index`. Panics if `index` is out of range.
    pub fn remove(&self, images: &[ImageRecord], index: usize) {
        self.commit(store::remove(images, index));
    }

    /// Make the image at `index` the cover.
    ///
    /// Returns `false` without calling `on_change` when reordering is
    /// disabled or the image already is the cover.
    pub fn promote_to_cover(&self, images: &[ImageRecord], index: usize) -> bool {
        if !self.config.features.enable_reorder || index == 0 {
            return false;
        }
        self.commit(store::promote_to_cover(images, index));
        true
    }

    /// Move the image at `from` to `to` (remove-then-insert).
    ///
    /// Returns `false` without calling `on_change` when reordering is
    /// disabled or `from == to`.
    pub fn reorder(&self, images: &[ImageRecord], from: usize, to: usize) -> bool {
        if !self.config.features.enable_reorder || from == to {
            return false;
        }
        self.commit(store::reorder(images, from, to));
        true
    }

    /// Badge to draw on the image at `index`, if any.
    pub fn cover_badge(&self, index: usize) -> Option<&str> {
        cover_label(index, &self.config.features)
    }

    /// Open the lightbox on `index`. `None` when preview is disabled or the
    /// index is past the end.
    pub fn preview(&self, images: &[ImageRecord], index: usize) -> Option<PreviewSession> {
        if !self.config.features.enable_preview {
            return None;
        }
        PreviewSession::open(images, index)
    }

    // =========================================================================
    // Crop
    // =========================================================================

    fn source<'a>(&self, url: &'a str) -> Source<'a> {
        Source::classify(url, &self.config.sources.local_upload_prefixes)
    }

    /// Open a crop dialog on the image at `index`.
    ///
    /// Loads the source to learn its dimensions; the session starts centered
    /// at minimum zoom.
    pub async fn open_crop(&self, images: &[ImageRecord], index: usize) -> Result<CropSession, CropError> {
        if !self.config.features.enable_crop {
            return Err(CropError::Disabled);
        }
        let record = &images[index];
        let dimensions =
            match operations::identify(&*self.loader, &*self.backend, self.source(&record.url)).await {
                Ok(dimensions) => dimensions,
                Err(err) => {
                    log::warn!("cannot open {} for cropping: {err}", record.id);
                    self.notify(Notice::error("Cannot open image", err.to_string()));
                    return Err(err.into());
                }
            };
        let crop = &self.config.crop;
        Ok(CropSession::new(
            record,
            dimensions,
            crop.aspect(),
            (crop.min_zoom, crop.max_zoom),
        ))
    }

    /// Crop the session's image to its current rectangle and replace the
    /// record's URL with the result.
    ///
    /// Returns the new URL. On failure the owner's list is left as it was
    /// and an error notice is sent; the session stays usable for a retry.
    pub async fn save_crop(&self, images: &[ImageRecord], session: &CropSession) -> Result<String, CropError> {
        if !self.config.features.enable_crop {
            return Err(CropError::Disabled);
        }
        if store::position(images, session.id()).is_none() {
            return Err(CropError::NotFound(session.id().clone()));
        }
        match self.crop_to_url(session).await {
            Ok(url) => {
                log::info!("crop of {} committed", session.id());
                self.commit(store::update_one(images, session.id(), &url));
                self.notify(Notice::crop_saved());
                Ok(url)
            }
            Err(err) => {
                log::warn!("crop of {} failed: {err}", session.id());
                self.notify(Notice::crop_failed(&err));
                Err(err)
            }
        }
    }

    async fn crop_to_url(&self, session: &CropSession) -> Result<String, CropError> {
        let embedded = self.crop_uploader.is_none();
        let output = operations::crop(
            &*self.loader,
            &*self.backend,
            self.source(session.source_url()),
            session.pixel_rect(),
            embedded,
        )
        .await?;
        Ok(match (output, &self.crop_uploader) {
            (CropOutput::Embedded(url), _) => url,
            (CropOutput::Binary(image), Some(uploader)) => uploader.upload_crop(session.id(), &image).await?,
            (CropOutput::Binary(image), None) => to_data_url(image.media_type, &image.bytes),
        })
    }
}
