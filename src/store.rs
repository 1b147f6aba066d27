//! Pure state transitions over an [`ImageList`].
//!
//! Every function takes the current snapshot and returns the next one; none
//! of them keeps state. The cover is whatever sits at position 0. There is
//! no flag to keep in sync, so every transition preserves the cover rule by
//! construction.
//!
//! Indices always come from the list the caller just rendered. An index out
//! of range is a programming error and panics, the same way `Vec::remove` does.

use crate::types::{ImageId, ImageList, ImageRecord};

/// Append `new_records`, keeping their relative order.
///
/// The count ceiling is checked before records are built, so this is a
/// plain append.
pub fn add(list: &[ImageRecord], new_records: Vec<ImageRecord>) -> ImageList {
    let mut next = list.to_vec();
    next.extend(new_records);
    next
}

/// Remove the element at `index`; later elements shift down by one.
pub fn remove(list: &[ImageRecord], index: usize) -> ImageList {
    let mut next = list.to_vec();
    next.remove(index);
    next
}

/// Move the element at `index` to position 0, keeping the order of the rest.
pub fn promote_to_cover(list: &[ImageRecord], index: usize) -> ImageList {
    reorder(list, index, 0)
}

/// Remove the element at `from` and reinsert it at `to`, where `to` is an
/// index into the list *after* the removal.
pub fn reorder(list: &[ImageRecord], from: usize, to: usize) -> ImageList {
    let mut next = list.to_vec();
    if from != to {
        let moved = next.remove(from);
        next.insert(to, moved);
    }
    next
}

/// Replace the URL of the record with `id`. Position and every other field
/// stay as they are; an unknown id leaves the list unchanged.
pub fn update_one(list: &[ImageRecord], id: &ImageId, url: &str) -> ImageList {
    list.iter()
        .map(|record| {
            if &record.id == id {
                ImageRecord {
                    url: url.to_string(),
                    ..record.clone()
                }
            } else {
                record.clone()
            }
        })
        .collect()
}

/// The cover image, if the list is non-empty.
pub fn cover(list: &[ImageRecord]) -> Option<&ImageRecord> {
    list.first()
}

/// Position of the record with `id`.
pub fn position(list: &[ImageRecord], id: &ImageId) -> Option<usize> {
    list.iter().position(|r| &r.id == id)
}
