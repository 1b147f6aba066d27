//! Batch intake: validate, resolve, commit.
//!
//! ```text
//! Idle → Validating → Processing → Idle
//!            │
//!            └──(count ceiling exceeded, or nothing accepted)──→ Idle
//! ```
//!
//! 1. The count ceiling is checked for the whole batch. If it is exceeded the
//!    batch is rejected with one error and no file is looked at.
//! 2. Every file is validated; all rejections are collected.
//! 3. Accepted files are resolved one after another, in selection order,
//!    through the [`bridge`](crate::bridge).
//! 4. The new records are appended in one step.
//!
//! If any file fails to resolve, the whole batch is abandoned: records built
//! for earlier files in the same batch are dropped, not committed. A failed
//! batch is retried by selecting the files again.

use crate::bridge::{ProcessingError, Uploader, to_displayable};
use crate::config::ImagesConfig;
use crate::store;
use crate::types::{ImageId, ImageList, ImageRecord, SourceFile};
use crate::validate::{ValidationError, check_batch, partition};
use std::cell::Cell;

/// Where the orchestrator is in the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeState {
    Idle,
    Validating,
    Processing,
}

/// How a batch ended.
#[derive(Debug)]
pub enum IntakeOutcome {
    /// Another batch is still in flight; this one was ignored.
    Busy,
    /// The batch would exceed the count ceiling; nothing was processed.
    BatchRejected(ValidationError),
    /// No file passed validation; nothing to commit.
    NothingAccepted { rejected: Vec<ValidationError> },
    /// Every accepted file resolved; `list` is the next snapshot.
    Committed {
        list: ImageList,
        added: usize,
        rejected: Vec<ValidationError>,
    },
    /// A file failed to resolve; the batch was abandoned.
    Abandoned {
        error: ProcessingError,
        rejected: Vec<ValidationError>,
    },
}

impl IntakeOutcome {
    /// Per-file validation rejections reported alongside the outcome.
    pub fn rejected(&self) -> &[ValidationError] {
        match self {
            Self::NothingAccepted { rejected }
            | Self::Committed { rejected, .. }
            | Self::Abandoned { rejected, .. } => rejected,
            Self::Busy | Self::BatchRejected(_) => &[],
        }
    }
}

/// Intake state for one field instance.
///
/// Single-threaded by construction: the state lives in a [`Cell`], so an
/// `Intake` cannot be shared across threads, and a second batch started while
/// the first is awaiting an upload sees `Processing` and backs off.
#[derive(Debug)]
pub struct Intake {
    state: Cell<IntakeState>,
}

impl Default for Intake {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the orchestrator to `Idle` however the batch ends, including when
/// the intake future is dropped mid-flight.
struct IdleOnDrop<'a>(&'a Cell<IntakeState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set(IntakeState::Idle);
    }
}

impl Intake {
    pub fn new() -> Self {
        Self {
            state: Cell::new(IntakeState::Idle),
        }
    }

    pub fn state(&self) -> IntakeState {
        self.state.get()
    }

    /// Run one batch against the `current` snapshot.
    ///
    /// Never commits anything itself: a successful batch returns the next
    /// snapshot in [`IntakeOutcome::Committed`] for the owner to apply.
    pub async fn run(
        &self,
        current: &[ImageRecord],
        files: Vec<SourceFile>,
        limits: &ImagesConfig,
        uploader: Option<&dyn Uploader>,
    ) -> IntakeOutcome {
        if self.state.get() != IntakeState::Idle {
            log::warn!("intake already in progress, ignoring {} file(s)", files.len());
            return IntakeOutcome::Busy;
        }
        let _idle = IdleOnDrop(&self.state);

        self.state.set(IntakeState::Validating);
        if let Some(err) = check_batch(current.len(), files.len(), limits.max_images) {
            log::warn!("batch rejected: {err}");
            return IntakeOutcome::BatchRejected(err);
        }

        let (accepted, rejected) = partition(files, &limits.allowed_types, limits.max_file_size);
        for err in &rejected {
            log::warn!("file rejected: {err}");
        }
        if accepted.is_empty() {
            return IntakeOutcome::NothingAccepted { rejected };
        }

        self.state.set(IntakeState::Processing);
        log::debug!("resolving {} file(s)", accepted.len());
        let mut records = Vec::with_capacity(accepted.len());
        for file in accepted {
            match to_displayable(&file, uploader).await {
                Ok(url) => records.push(ImageRecord {
                    id: ImageId::generate(),
                    url,
                    file: Some(file),
                }),
                Err(error) => {
                    log::warn!(
                        "abandoning batch after {} resolved file(s): {error}",
                        records.len()
                    );
                    return IntakeOutcome::Abandoned { error, rejected };
                }
            }
        }

        let added = records.len();
        let list = store::add(current, records);
        log::info!("intake committed {added} image(s), {} total", list.len());
        IntakeOutcome::Committed {
            list,
            added,
            rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        FailingUploader, RecordingUploader, ids, jpeg_file, list_of, names_of,
    };
    use futures::executor::block_on;

    fn limits() -> ImagesConfig {
        ImagesConfig::default()
    }

    #[test]
    fn commits_accepted_files_in_selection_order() {
        let intake = Intake::new();
        let files = vec![jpeg_file("one.jpg", 8, 8), jpeg_file("two.jpg", 8, 8)];

        let outcome = block_on(intake.run(&[], files, &limits(), None));

        let IntakeOutcome::Committed { list, added, rejected } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(added, 2);
        assert!(rejected.is_empty());
        assert_eq!(names_of(&list), vec!["one.jpg", "two.jpg"]);
        assert!(list.iter().all(|r| r.url.starts_with("data:image/jpeg;base64,")));
        assert_ne!(list[0].id, list[1].id);
        assert_eq!(intake.state(), IntakeState::Idle);
    }

    #[test]
    fn appends_after_existing_records() {
        let intake = Intake::new();
        let current = list_of(&["a", "b"]);

        let outcome = block_on(intake.run(&current, vec![jpeg_file("c.jpg", 4, 4)], &limits(), None));

        let IntakeOutcome::Committed { list, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(&ids(&list)[..2], &["a", "b"]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn count_ceiling_rejects_whole_batch_before_validation() {
        let intake = Intake::new();
        let current = list_of(&["a"]);
        let uploader = RecordingUploader::new("https://cdn/");
        // Mix in an invalid file: it must not produce a per-file error
        let mut files: Vec<SourceFile> = (0..9).map(|i| jpeg_file(&format!("{i}.jpg"), 2, 2)).collect();
        files.push(SourceFile::from_bytes("bad.txt", "text/plain", vec![0u8]));

        let outcome = block_on(intake.run(&current, files, &limits(), Some(&uploader)));

        assert!(matches!(
            outcome,
            IntakeOutcome::BatchRejected(ValidationError::TooManyImages {
                current: 1,
                incoming: 10,
                max: 10
            })
        ));
        assert!(outcome.rejected().is_empty());
        assert!(uploader.uploaded().is_empty());
    }

    #[test]
    fn exactly_filling_the_ceiling_is_allowed() {
        let intake = Intake::new();
        let current = list_of(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let files = vec![jpeg_file("i.jpg", 2, 2), jpeg_file("j.jpg", 2, 2)];

        let outcome = block_on(intake.run(&current, files, &limits(), None));
        assert!(matches!(outcome, IntakeOutcome::Committed { added: 2, .. }));
    }

    #[test]
    fn rejections_are_reported_alongside_commit() {
        let intake = Intake::new();
        let files = vec![
            jpeg_file("ok.jpg", 4, 4),
            SourceFile::from_bytes("notes.txt", "text/plain", vec![1u8]),
            SourceFile::from_bytes("huge.png", "image/png", vec![0u8; 6 * 1024 * 1024]),
        ];

        let outcome = block_on(intake.run(&[], files, &limits(), None));

        let IntakeOutcome::Committed { added, rejected, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(added, 1);
        assert_eq!(rejected.len(), 2);
        assert!(matches!(rejected[0], ValidationError::UnsupportedType { .. }));
        assert!(matches!(rejected[1], ValidationError::TooLarge { .. }));
    }

    #[test]
    fn nothing_accepted_commits_nothing() {
        let intake = Intake::new();
        let files = vec![SourceFile::from_bytes("a.bmp", "image/bmp", vec![1u8])];

        let outcome = block_on(intake.run(&[], files, &limits(), None));
        assert!(matches!(outcome, IntakeOutcome::NothingAccepted { ref rejected } if rejected.len() == 1));
    }

    #[test]
    fn uploader_urls_are_used_verbatim() {
        let intake = Intake::new();
        let uploader = RecordingUploader::new("https://cdn.example.com/u/");
        let files = vec![jpeg_file("a.jpg", 2, 2), jpeg_file("b.jpg", 2, 2)];

        let outcome = block_on(intake.run(&[], files, &limits(), Some(&uploader)));

        let IntakeOutcome::Committed { list, .. } = outcome else {
            panic!("expected commit");
        };
        assert_eq!(list[0].url, "https://cdn.example.com/u/a.jpg");
        assert_eq!(list[1].url, "https://cdn.example.com/u/b.jpg");
        assert_eq!(uploader.uploaded(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn failure_mid_batch_abandons_everything() {
        let intake = Intake::new();
        let uploader = FailingUploader::on_call(1);
        let files = vec![
            jpeg_file("a.jpg", 2, 2),
            jpeg_file("b.jpg", 2, 2),
            jpeg_file("c.jpg", 2, 2),
        ];

        let outcome = block_on(intake.run(&[], files, &limits(), Some(&uploader)));

        let IntakeOutcome::Abandoned { error, .. } = outcome else {
            panic!("expected abandoned batch");
        };
        assert!(matches!(error, ProcessingError::Upload { ref file, .. } if file == "b.jpg"));
        // Resolution stops at the failing file
        assert_eq!(uploader.calls(), 2);
        assert_eq!(intake.state(), IntakeState::Idle);
    }

    #[test]
    fn busy_while_processing() {
        let intake = Intake::new();
        intake.state.set(IntakeState::Processing);

        let outcome = block_on(intake.run(&[], vec![jpeg_file("a.jpg", 2, 2)], &limits(), None));
        assert!(matches!(outcome, IntakeOutcome::Busy));
        // A busy refusal must not reset the running batch's state
        assert_eq!(intake.state(), IntakeState::Processing);
    }

    #[test]
    fn dropped_future_returns_to_idle() {
        use futures::FutureExt;

        let intake = Intake::new();
        let uploader = crate::test_helpers::PendingUploader;
        let limits = limits();
        {
            let mut fut = Box::pin(intake.run(&[], vec![jpeg_file("a.jpg", 2, 2)], &limits, Some(&uploader)));
            assert!((&mut fut).now_or_never().is_none());
            assert_eq!(intake.state(), IntakeState::Processing);
        }
        assert_eq!(intake.state(), IntakeState::Idle);
    }
}
