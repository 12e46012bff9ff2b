//! Normalized coordinate mathematics.
//!
//! Note geometry is stored as fractions of the *displayed image box*, the
//! rectangle the image occupies once it has been fitted into its frame. The
//! functions here convert between that normalized form and viewport pixels.

use serde::{Deserialize, Serialize};

use crate::constants::MIN_NORM_SIZE;

/// A width/height pair in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    /// Size from width and height.
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    /// Whether both sides are strictly positive.
    pub fn is_usable(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }
}

/// An axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Rect from origin and size.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.w, size.h)
    }

    /// Translate by a pointer delta.
    pub fn offset(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Vertical midpoint.
    pub fn mid_y(&self) -> f64 {
        self.y + self.h / 2.0
    }
}

/// A rectangle expressed as fractions of an image box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormRect {
    pub nx: f64,
    pub ny: f64,
    pub nw: f64,
    pub nh: f64,
}

impl NormRect {
    /// Normalized rect, stored as given; see [`NormRect::clamped`].
    pub fn new(nx: f64, ny: f64, nw: f64, nh: f64) -> Self {
        Self { nx, ny, nw, nh }
    }

    /// Clamp into the legal note ranges: position in `[0,1]`, size in `[0.05,1]`.
    ///
    /// NaN components collapse to the lower bound.
    pub fn clamped(&self) -> NormRect {
        NormRect {
            nx: clamp(self.nx, 0.0, 1.0),
            ny: clamp(self.ny, 0.0, 1.0),
            nw: clamp(self.nw, MIN_NORM_SIZE, 1.0),
            nh: clamp(self.nh, MIN_NORM_SIZE, 1.0),
        }
    }
}

/// Clamp that also maps NaN to `min`.
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    if v.is_nan() { min } else { v.max(min).min(max) }
}

/// Fit an image of the given intrinsic size into `frame`, preserving aspect
/// ratio, centred on both axes.
pub fn fit_contain(frame: Size, intrinsic: (u32, u32)) -> Rect {
    let iw = f64::from(intrinsic.0.max(1));
    let ih = f64::from(intrinsic.1.max(1));
    let scale = (frame.w / iw).min(frame.h / ih);
    let w = iw * scale;
    let h = ih * scale;
    Rect::new((frame.w - w) / 2.0, (frame.h - h) / 2.0, w, h)
}

/// The normalization frame for the image currently shown in `frame`.
///
/// Falls back to the frame itself when the image is missing, not yet
/// decoded, or zero-sized, so that conversions stay well-defined before the
/// image finishes loading.
pub fn image_box(frame: Size, intrinsic: Option<(u32, u32)>) -> Rect {
    let fw = if frame.w > 0.0 { frame.w } else { 1.0 };
    let fh = if frame.h > 0.0 { frame.h } else { 1.0 };

    let Some(dims) = intrinsic.filter(|(w, h)| *w > 0 && *h > 0) else {
        return Rect::new(0.0, 0.0, fw, fh);
    };
    if !frame.is_usable() {
        return Rect::new(0.0, 0.0, fw, fh);
    }

    let fitted = fit_contain(frame, dims);
    Rect {
        x: clamp(fitted.x, 0.0, fw),
        y: clamp(fitted.y, 0.0, fh),
        w: clamp(fitted.w, 1.0, fw),
        h: clamp(fitted.h, 1.0, fh),
    }
}

/// Project a normalized rect into pixels against `image_box`.
pub fn to_pixels(norm: &NormRect, image_box: &Rect) -> Rect {
    Rect {
        x: image_box.x + norm.nx * image_box.w,
        y: image_box.y + norm.ny * image_box.h,
        w: norm.nw * image_box.w,
        h: norm.nh * image_box.h,
    }
}

/// Normalize a pixel rect against `image_box` and clamp it into legal ranges.
pub fn to_normalized(rect: &Rect, image_box: &Rect) -> NormRect {
    let bw = if image_box.w > 0.0 { image_box.w } else { 1.0 };
    let bh = if image_box.h > 0.0 { image_box.h } else { 1.0 };
    NormRect {
        nx: (rect.x - image_box.x) / bw,
        ny: (rect.y - image_box.y) / bh,
        nw: rect.w / bw,
        nh: rect.h / bh,
    }
    .clamped()
}

/// Project geometry stored under the legacy frame-relative scheme.
pub fn legacy_to_pixels(norm: &NormRect, frame: Size) -> Rect {
    let fw = if frame.w > 0.0 { frame.w } else { 1.0 };
    let fh = if frame.h > 0.0 { frame.h } else { 1.0 };
    to_pixels(norm, &Rect::new(0.0, 0.0, fw, fh))
}
