//! User-facing output: notices and list display.
//!
//! # Notices
//!
//! Every outcome a user should hear about becomes a [`Notice`]: a kind, a
//! short title and a human-readable description. The field sends notices
//! on an optional channel and never raises them into the caller's control
//! flow. Independent reports about the same batch are separate notices: a
//! batch can produce a success notice *and* a rejection notice.
//!
//! ```text
//! ✓ Images added
//!     2 images added.
//! ✗ Some files were rejected
//!     notes.txt: unsupported file type 'text/plain' (allowed: image/jpeg, image/png)
//! ```
//!
//! # List Display
//!
//! Records lead with their position and id; the URL and the original file
//! are indented context lines. Embedded URLs are shortened to their media
//! type and payload size, since a full data URL is useless on a terminal.
//!
//! ```text
//! 001 2f6c1c1e-… [Cover]
//!     Source: data:image/jpeg (18.2 KB embedded)
//!     File: beach.jpg (14.1 KB)
//! 002 a0e5…
//!     Source: https://cdn.example.com/u/dune.jpg
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout or stderr.
//! Format functions are pure.

use crate::config::FeaturesConfig;
use crate::intake::IntakeOutcome;
use crate::types::ImageRecord;
use crate::validate::{ValidationError, format_size};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast-equivalent user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }

    /// Notices reporting how an intake batch ended.
    ///
    /// The success report and the rejection report are independent; both
    /// fire for a batch that committed some files and rejected others.
    pub fn for_intake(outcome: &IntakeOutcome) -> Vec<Notice> {
        let mut notices = Vec::new();
        match outcome {
            IntakeOutcome::Busy => {}
            IntakeOutcome::BatchRejected(err) => {
                notices.push(Notice::error("Too many images", err.to_string()));
            }
            IntakeOutcome::Committed { added, .. } => {
                notices.push(Notice::success(
                    "Images added",
                    format!("{} added.", plural(*added, "image", "images")),
                ));
            }
            IntakeOutcome::Abandoned { error, .. } => {
                notices.push(Notice::error(
                    "Upload failed",
                    format!("{error}. No images from this selection were added."),
                ));
            }
            IntakeOutcome::NothingAccepted { .. } => {}
        }
        if let Some(notice) = Notice::for_rejections(outcome.rejected()) {
            notices.push(notice);
        }
        notices
    }

    /// One notice aggregating every per-file rejection, if there are any.
    pub fn for_rejections(rejected: &[ValidationError]) -> Option<Notice> {
        if rejected.is_empty() {
            return None;
        }
        let description = rejected
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Some(Notice::error("Some files were rejected", description))
    }

    pub fn crop_saved() -> Self {
        Notice::success("Image cropped", "The cropped image replaced the original.")
    }

    pub fn crop_failed(error: &dyn fmt::Display) -> Self {
        Notice::error(
            "Crop failed",
            format!("{error}. The original image was kept."),
        )
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

/// Short form of a URL for display.
///
/// ```text
/// data:image/jpeg (18.2 KB embedded)
/// https://cdn.example.com/u/dune.jpg
/// ```
fn display_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("data:")
        && let Some((header, payload)) = rest.split_once(',')
    {
        let media_type = header.split(';').next().unwrap_or_default();
        // base64 packs three bytes into four characters
        let bytes = payload.len() as u64 * 3 / 4;
        return format!("data:{media_type} ({} embedded)", format_size(bytes));
    }
    truncate(url, 72)
}

// ============================================================================
// Notices
// ============================================================================

/// Format a notice: a marked title line followed by indented description
/// lines.
pub fn format_notice(notice: &Notice) -> Vec<String> {
    let mark = match notice.kind {
        NoticeKind::Success => "✓",
        NoticeKind::Error => "✗",
    };
    let mut lines = vec![format!("{mark} {}", notice.title)];
    lines.extend(
        notice
            .description
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| format!("{}{}", indent(1), line)),
    );
    lines
}

/// Print a notice; errors go to stderr.
pub fn print_notice(notice: &Notice) {
    for line in format_notice(notice) {
        if notice.is_error() {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

// ============================================================================
// Image list
// ============================================================================

/// Format the image list in display order.
///
/// The cover badge is shown on position 0 only, and only when enabled.
pub fn format_list(list: &[ImageRecord], features: &FeaturesConfig) -> Vec<String> {
    if list.is_empty() {
        return vec!["No images".to_string()];
    }
    let mut lines = Vec::new();
    for (i, record) in list.iter().enumerate() {
        let header = format!("{} {}", format_index(i + 1), record.id);
        lines.push(match cover_label(i, features) {
            Some(label) => format!("{header} [{label}]"),
            None => header,
        });
        lines.push(format!("{}Source: {}", indent(1), display_url(&record.url)));
        if let Some(file) = &record.file {
            lines.push(format!(
                "{}File: {} ({})",
                indent(1),
                file.name(),
                format_size(file.size())
            ));
        }
    }
    lines
}

pub fn print_list(list: &[ImageRecord], features: &FeaturesConfig) {
    for line in format_list(list, features) {
        println!("{line}");
    }
}

/// Badge label for the image at `index`, if it gets one.
pub(crate) fn cover_label(index: usize, features: &FeaturesConfig) -> Option<&str> {
    (index == 0 && features.show_cover_badge).then_some(features.cover_badge_label.as_str())
}
