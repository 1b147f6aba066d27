//! Pure geometry for the crop pipeline.
//!
//! All functions here are pure and testable without any I/O or images.
//! Coordinates are in source-image pixels unless a name says "normalized",
//! in which case `0.0..=1.0` spans the full source width or height.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A crop rectangle in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// The rectangle covering a whole image.
    pub fn full(dims: Dimensions) -> Self {
        Self {
            x: 0,
            y: 0,
            width: dims.width,
            height: dims.height,
        }
    }

    /// Clamp the rectangle so it lies inside `dims`, shrinking it if needed.
    pub fn clamp_to(self, dims: Dimensions) -> Self {
        let x = self.x.min(dims.width.saturating_sub(1));
        let y = self.y.min(dims.height.saturating_sub(1));
        Self {
            x,
            y,
            width: self.width.min(dims.width - x),
            height: self.height.min(dims.height - y),
        }
    }

    /// The part of this rectangle that overlaps an image of size `dims`,
    /// as `(x, y, width, height)`. Zero-sized when there is no overlap.
    pub fn intersect(self, dims: Dimensions) -> (u32, u32, u32, u32) {
        let width = self.width.min(dims.width.saturating_sub(self.x));
        let height = self.height.min(dims.height.saturating_sub(self.y));
        (self.x, self.y, width, height)
    }
}

/// Largest window of aspect `aspect` (width / height) that fits in `dims`.
///
/// Returned as floating-point `(width, height)` so zoom can be applied
/// before rounding.
///
/// ```
/// # use image_stack::imaging::geometry::{Dimensions, fit_window};
/// // 4:3 window in a square image: full width, 3/4 of the height
/// let (w, h) = fit_window(Dimensions { width: 1000, height: 1000 }, 4.0 / 3.0);
/// assert_eq!((w, h), (1000.0, 750.0));
/// ```
pub fn fit_window(dims: Dimensions, aspect: f64) -> (f64, f64) {
    let w = dims.width as f64;
    let h = dims.height as f64;
    if w / h > aspect {
        // Source is wider than the window: height is the limit
        (h * aspect, h)
    } else {
        (w, w / aspect)
    }
}

/// Size of the crop window at `zoom` (zoom 1 = [`fit_window`]).
pub fn window_at_zoom(dims: Dimensions, aspect: f64, zoom: f64) -> (f64, f64) {
    let (w, h) = fit_window(dims, aspect);
    (w / zoom, h / zoom)
}

/// Clamp a normalized center so a window of `window` pixels stays inside `dims`.
pub fn clamp_center(center: (f64, f64), window: (f64, f64), dims: Dimensions) -> (f64, f64) {
    // A window wider than the source pins the center to the middle
    let half_x = (window.0 / (2.0 * dims.width as f64)).min(0.5);
    let half_y = (window.1 / (2.0 * dims.height as f64)).min(0.5);
    (
        center.0.clamp(half_x, 1.0 - half_x),
        center.1.clamp(half_y, 1.0 - half_y),
    )
}

/// Pixel rectangle for a window of size `window` centered at a normalized
/// `center` in an image of size `dims`.
///
/// Sizes are floored so the rectangle never reaches past the source; the
/// origin is rounded, then pulled back inside the image.
pub fn window_to_rect(center: (f64, f64), window: (f64, f64), dims: Dimensions) -> PixelRect {
    let width = (window.0.floor() as u32).clamp(1, dims.width.max(1));
    let height = (window.1.floor() as u32).clamp(1, dims.height.max(1));
    let x = (center.0 * dims.width as f64 - window.0 / 2.0).round().max(0.0) as u32;
    let y = (center.1 * dims.height as f64 - window.1 / 2.0).round().max(0.0) as u32;
    PixelRect {
        x: x.min(dims.width.saturating_sub(width)),
        y: y.min(dims.height.saturating_sub(height)),
        width,
        height,
    }
}
