//! # Image Stack
//!
//! The core of an image-collection form field: pick files, validate them,
//! turn them into displayable URLs, crop them, reorder them and choose a
//! cover. Rendering is someone else's job; this crate is everything behind
//! the buttons.
//!
//! # Architecture: Controlled Component
//!
//! The field never owns the image list. The owner passes in the snapshot it
//! last rendered and receives the next one through `on_change`:
//!
//! ```text
//! owner's list ──▶ ImageField::{add_files, remove, reorder, save_crop, ...}
//!      ▲                               │
//!      └──────── on_change(next) ◀─────┘   (exactly once per mutation)
//! ```
//!
//! Every list transition is a pure function in [`store`], so the ordering
//! rules are testable without any I/O, and a failed upload or crop can never
//! leave a half-applied list behind: nothing is committed until the whole
//! operation has succeeded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | `ImageId`, `ImageRecord`, `SourceFile`, `ImageList` |
//! | [`validate`] | Type and size checks per file, count ceiling per batch |
//! | [`bridge`] | File bytes → data URL or caller upload; collaborator traits |
//! | [`imaging`] | Crop engine: fetch policy, decode, exact-size surface, JPEG encode |
//! | [`store`] | Pure list transitions: add, remove, reorder, promote, update |
//! | [`intake`] | Batch orchestration: validate → resolve → commit |
//! | [`session`] | Crop dialog pan/zoom state and the preview lightbox |
//! | [`field`] | `ImageField`, tying configuration, collaborators and notices together |
//! | [`output`] | Notices and terminal formatting |
//! | [`config`] | Layered `config.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## The Cover Is Position 0
//!
//! There is no `is_cover` flag. Whatever record sits first is the cover, so
//! removing, reordering and promoting cannot desynchronize it.
//!
//! ## Embedded by Default
//!
//! Without an uploader, new files and crop results become `data:` URLs. The
//! field works with zero infrastructure; callers who need durable URLs plug
//! in an [`Uploader`](bridge::Uploader) or [`CropUploader`](bridge::CropUploader).
//!
//! ## All-or-Nothing Batches
//!
//! Files in a batch are resolved one at a time in selection order. If one of
//! them fails, the batch is abandoned: files resolved before it are dropped
//! rather than committed. The user re-selects and tries again.
//!
//! ## Single-Threaded Async
//!
//! Collaborators return `LocalBoxFuture`s and the field keeps its small
//! amount of state in `Cell`/`RefCell`. Everything runs on the one task that
//! drives the UI; there is nothing to lock.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, cropping and encoding use the `image` crate only. No system
//! libraries, no canvas: the crop is an exact-size surface with the
//! selected region copied in at the origin, encoded as JPEG at quality 95.

pub mod bridge;
pub mod config;
pub mod field;
pub mod imaging;
pub mod intake;
pub mod output;
pub mod session;
pub mod store;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
