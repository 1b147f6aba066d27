//! File and batch validation.
//!
//! Validation errors are data: every function here returns `Option` rather
//! than `Result`, and a rejected file never stops the rest of a batch. The
//! count ceiling is the one exception, checked once for the whole batch
//! before any file is looked at.

use crate::types::SourceFile;
use thiserror::Error;

/// Why a file or a batch was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{file}: unsupported file type '{media_type}' (allowed: {})", .allowed.join(", "))]
    UnsupportedType {
        file: String,
        media_type: String,
        allowed: Vec<String>,
    },
    #[error("{file}: {} exceeds the {} limit", size_label(.size), size_label(.max))]
    TooLarge { file: String, size: u64, max: u64 },
    #[error("at most {max} images allowed ({current} already added, {incoming} selected)")]
    TooManyImages {
        current: usize,
        incoming: usize,
        max: usize,
    },
}

impl ValidationError {
    /// The offending file, for per-file errors.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedType { file, .. } | Self::TooLarge { file, .. } => Some(file),
            Self::TooManyImages { .. } => None,
        }
    }
}

/// Check one file against the type allow-list and the size ceiling.
///
/// The type rule is checked first, so a file breaking both rules yields a
/// single type error.
pub fn validate_file(
    file: &SourceFile,
    allowed_types: &[String],
    max_size: u64,
) -> Option<ValidationError> {
    if !allowed_types.iter().any(|t| t == file.media_type()) {
        return Some(ValidationError::UnsupportedType {
            file: file.name().to_string(),
            media_type: file.media_type().to_string(),
            allowed: allowed_types.to_vec(),
        });
    }
    if file.size() > max_size {
        return Some(ValidationError::TooLarge {
            file: file.name().to_string(),
            size: file.size(),
            max: max_size,
        });
    }
    None
}

/// Check whether `incoming` more images fit next to `current` ones.
pub fn check_batch(current: usize, incoming: usize, max_images: usize) -> Option<ValidationError> {
    if current + incoming > max_images {
        Some(ValidationError::TooManyImages {
            current,
            incoming,
            max: max_images,
        })
    } else {
        None
    }
}

/// Split a batch into accepted files and collected rejections, preserving
/// selection order on both sides.
pub fn partition(
    files: Vec<SourceFile>,
    allowed_types: &[String],
    max_size: u64,
) -> (Vec<SourceFile>, Vec<ValidationError>) {
    let mut accepted = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();
    for file in files {
        match validate_file(&file, allowed_types, max_size) {
            Some(err) => rejected.push(err),
            None => accepted.push(file),
        }
    }
    (accepted, rejected)
}

fn size_label(bytes: &u64) -> String {
    format_size(*bytes)
}

/// Human-readable byte size (`512 B`, `1.5 KB`, `5 MB`).
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    let (value, unit) = if b >= MB {
        (b / MB, "MB")
    } else if b >= KB {
        (b / KB, "KB")
    } else {
        return format!("{bytes} B");
    };
    if value.fract() == 0.0 {
        format!("{value:.0} {unit}")
    } else {
        format!("{value:.1} {unit}")
    }
}
