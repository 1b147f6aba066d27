//! Short-lived dialog state.
//!
//! A [`CropSession`] is created when the crop dialog opens and dropped when
//! it closes, saved or not; nothing in it outlives the dialog. Dropping a
//! session has no effect on the image list.

use crate::imaging::geometry::{clamp_center, window_at_zoom, window_to_rect};
use crate::imaging::{Dimensions, PixelRect};
use crate::types::{ImageId, ImageRecord};

/// Pan/zoom state of one crop dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct CropSession {
    id: ImageId,
    source_url: String,
    source: Dimensions,
    aspect: f64,
    zoom_range: (f64, f64),
    /// Normalized window center, `0.0..=1.0` on each axis of the source.
    center: (f64, f64),
    zoom: f64,
    /// Last computed crop rectangle; the value consumed at save time.
    rect: PixelRect,
}

impl CropSession {
    /// Open a session on `record`, whose image is `source` pixels large.
    /// Starts centered at the minimum zoom.
    ///
    /// The zoom range is pulled into `1.0..` with `max >= min`, so the crop
    /// window never outgrows the source.
    pub fn new(
        record: &ImageRecord,
        source: Dimensions,
        aspect: f64,
        zoom_range: (f64, f64),
    ) -> Self {
        let min = finite_or(zoom_range.0, 1.0).max(1.0);
        let max = finite_or(zoom_range.1, min).max(min);
        let zoom_range = (min, max);
        let mut session = Self {
            id: record.id.clone(),
            source_url: record.url.clone(),
            source,
            aspect,
            zoom_range,
            center: (0.5, 0.5),
            zoom: zoom_range.0,
            rect: PixelRect::full(source),
        };
        session.recompute();
        session
    }

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    /// URL of the image being cropped, as it was when the dialog opened.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn source_dimensions(&self) -> Dimensions {
        self.source
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn pixel_rect(&self) -> PixelRect {
        self.rect
    }

    /// Set the zoom, clamped to the configured range. NaN and infinities
    /// are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if !zoom.is_finite() {
            return;
        }
        self.zoom = zoom.clamp(self.zoom_range.0, self.zoom_range.1);
        self.recompute();
    }

    /// Move the window center to a normalized position. Non-finite
    /// coordinates are ignored.
    pub fn set_center(&mut self, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        self.center = (x, y);
        self.recompute();
    }

    /// Pan by a normalized offset. Non-finite offsets are ignored.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        self.center = (self.center.0 + dx, self.center.1 + dy);
        self.recompute();
    }

    /// Use an explicit rectangle, clamped to the source.
    ///
    /// Pan and zoom are left untouched; the next pan or zoom change
    /// recomputes the rectangle from them again.
    pub fn set_pixel_rect(&mut self, rect: PixelRect) {
        self.rect = rect.clamp_to(self.source);
    }

    fn recompute(&mut self) {
        let window = window_at_zoom(self.source, self.aspect, self.zoom);
        self.center = clamp_center(self.center, window, self.source);
        self.rect = window_to_rect(self.center, window, self.source);
        log::debug!(
            "crop window zoom={:.2} center=({:.3}, {:.3}) rect={:?}",
            self.zoom,
            self.center.0,
            self.center.1,
            self.rect
        );
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Lightbox position over the current list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSession {
    index: usize,
    len: usize,
}

impl PreviewSession {
    /// Open on `index`. `None` for an empty list or an index past the end.
    pub fn open(list: &[ImageRecord], index: usize) -> Option<Self> {
        (index < list.len()).then_some(Self {
            index,
            len: list.len(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Advance, wrapping from the last image to the first.
    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.len;
    }

    /// Step back, wrapping from the first image to the last.
    pub fn previous(&mut self) {
        self.index = (self.index + self.len - 1) % self.len;
    }

    /// The record currently shown.
    pub fn current<'a>(&self, list: &'a [ImageRecord]) -> Option<&'a ImageRecord> {
        list.get(self.index)
    }

    /// `"2 of 5"`.
    pub fn label(&self) -> String {
        format!("{} of {}", self.index + 1, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::list_of;

    fn session(width: u32, height: u32) -> CropSession {
        let record = ImageRecord::remote("img", "data:image/jpeg;base64,AA==");
        CropSession::new(&record, Dimensions { width, height }, 4.0 / 3.0, (1.0, 3.0))
    }

    #[test]
    fn opens_centered_at_min_zoom() {
        let s = session(1000, 1000);
        assert_eq!(s.zoom(), 1.0);
        assert_eq!(
            s.pixel_rect(),
            PixelRect {
                x: 0,
                y: 125,
                width: 1000,
                height: 750
            }
        );
    }

    #[test]
    fn zoom_is_clamped() {
        let mut s = session(1000, 1000);
        s.set_zoom(10.0);
        assert_eq!(s.zoom(), 3.0);
        s.set_zoom(0.2);
        assert_eq!(s.zoom(), 1.0);
    }

    #[test]
    fn non_finite_input_keeps_previous_state() {
        let mut s = session(1000, 1000);
        s.set_zoom(2.0);
        s.set_center(0.4, 0.6);
        let before = s.clone();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            s.set_zoom(bad);
            s.set_center(bad, 0.5);
            s.set_center(0.5, bad);
            s.pan_by(bad, 0.0);
            s.pan_by(0.0, bad);
        }
        assert_eq!(s, before);
    }

    #[test]
    fn zoom_range_is_pulled_into_bounds() {
        let record = ImageRecord::remote("img", "data:image/jpeg;base64,AA==");
        let source = Dimensions {
            width: 1000,
            height: 1000,
        };
        let s = CropSession::new(&record, source, 4.0 / 3.0, (0.5, 0.25));
        assert_eq!(s.zoom(), 1.0);
        assert_eq!(s.pixel_rect().width, 1000);

        let mut s = CropSession::new(&record, source, 4.0 / 3.0, (f64::NAN, f64::INFINITY));
        s.set_zoom(50.0);
        assert_eq!(s.zoom(), 1.0);
    }

    #[test]
    fn zooming_in_shrinks_rect_around_center() {
        let mut s = session(1000, 1000);
        s.set_zoom(2.0);
        assert_eq!(
            s.pixel_rect(),
            PixelRect {
                x: 250,
                y: 313,
                width: 500,
                height: 375
            }
        );
    }

    #[test]
    fn pan_is_clamped_to_source() {
        let mut s = session(1000, 1000);
        s.set_zoom(2.0);
        s.pan_by(-5.0, -5.0);
        let rect = s.pixel_rect();
        assert_eq!((rect.x, rect.y), (0, 0));
        s.pan_by(10.0, 10.0);
        let rect = s.pixel_rect();
        assert_eq!((rect.x + rect.width, rect.y + rect.height), (1000, 1000));
    }

    #[test]
    fn rect_tracks_latest_manipulation() {
        let mut s = session(1000, 1000);
        s.set_zoom(1000.0 / 750.0);
        s.set_center(0.475, 0.0);
        assert_eq!(
            s.pixel_rect(),
            PixelRect {
                x: 100,
                y: 0,
                width: 750,
                height: 562
            }
        );
    }

    #[test]
    fn explicit_rect_is_clamped() {
        let mut s = session(800, 600);
        s.set_pixel_rect(PixelRect {
            x: 700,
            y: 500,
            width: 400,
            height: 400,
        });
        assert_eq!(
            s.pixel_rect(),
            PixelRect {
                x: 700,
                y: 500,
                width: 100,
                height: 100
            }
        );
    }

    #[test]
    fn preview_wraps_both_ways() {
        let list = list_of(&["a", "b", "c"]);
        let mut p = PreviewSession::open(&list, 2).unwrap();
        p.next();
        assert_eq!(p.current(&list).unwrap().id.as_str(), "a");
        p.previous();
        assert_eq!(p.index(), 2);
        assert_eq!(p.label(), "3 of 3");
    }

    #[test]
    fn preview_rejects_out_of_range() {
        assert!(PreviewSession::open(&[], 0).is_none());
        assert!(PreviewSession::open(&list_of(&["a"]), 1).is_none());
    }
}
