//! Pure calculation functions for resize policy and image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{FitMode, ResizePlan};

/// Build the resize step for a set of requested dimensions.
///
/// | width | height | fit |
/// |---|---|---|
/// | unset | unset | no resize |
/// | set | unset | `Cover` if `!maintain_aspect_ratio`, else `Inside` |
/// | unset | set | `Cover` if `!maintain_aspect_ratio`, else `Inside` |
/// | set | set | `Cover` if `!maintain_aspect_ratio`, else `Inside` |
///
/// Enlargement is always disallowed.
pub fn plan_resize(
    width: Option<u32>,
    height: Option<u32>,
    maintain_aspect_ratio: bool,
) -> Option<ResizePlan> {
    if width.is_none() && height.is_none() {
        return None;
    }
    let fit = if maintain_aspect_ratio {
        FitMode::Inside
    } else {
        FitMode::Cover
    };
    Some(ResizePlan {
        width,
        height,
        fit,
        without_enlargement: true,
    })
}

/// Pixel geometry of a resize: what to scale to, then what to crop to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeGeometry {
    /// Dimensions after scaling (aspect ratio preserved).
    pub scaled: (u32, u32),
    /// Final dimensions after the centre crop. Equal to `scaled` when no crop.
    pub output: (u32, u32),
}

impl ResizeGeometry {
    pub fn needs_crop(&self) -> bool {
        self.scaled != self.output
    }

    /// Top-left offset of a centred crop window.
    pub fn crop_offset(&self) -> (u32, u32) {
        (
            (self.scaled.0 - self.output.0) / 2,
            (self.scaled.1 - self.output.1) / 2,
        )
    }
}

/// Calculate how a source image is scaled and cropped by a [`ResizePlan`].
///
/// - `Inside` scales by the smallest ratio over the constrained axes.
/// - `Cover` with both axes scales by the largest ratio and crops the
///   overflow; with one axis it behaves like `Inside`.
/// - With `without_enlargement`, the scale factor is capped at 1.0, so no
///   output axis ever exceeds the source.
///
/// # Examples
/// ```
/// # use recipe_images::imaging::calculate_resize;
/// # use recipe_images::imaging::{FitMode, ResizePlan};
/// let plan = ResizePlan { width: Some(1200), height: Some(800), fit: FitMode::Inside, without_enlargement: true };
/// assert_eq!(calculate_resize((2400, 1200), &plan).output, (1200, 600));
/// ```
pub fn calculate_resize(source: (u32, u32), plan: &ResizePlan) -> ResizeGeometry {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let ratio_w = plan.width.map(|w| w as f64 / src_w as f64);
    let ratio_h = plan.height.map(|h| h as f64 / src_h as f64);

    let mut scale = match (plan.fit, ratio_w, ratio_h) {
        (_, None, None) => 1.0,
        (_, Some(r), None) | (_, None, Some(r)) => r,
        (FitMode::Inside, Some(rw), Some(rh)) => rw.min(rh),
        (FitMode::Cover, Some(rw), Some(rh)) => rw.max(rh),
    };
    if plan.without_enlargement {
        scale = scale.min(1.0);
    }

    let scaled = (
        scale_axis(src_w, scale, plan.width, plan.fit),
        scale_axis(src_h, scale, plan.height, plan.fit),
    );

    let output = match plan.fit {
        FitMode::Inside => scaled,
        FitMode::Cover => (
            plan.width.map_or(scaled.0, |w| w.min(scaled.0)),
            plan.height.map_or(scaled.1, |h| h.min(scaled.1)),
        ),
    };

    ResizeGeometry { scaled, output }
}

fn scale_axis(length: u32, scale: f64, bound: Option<u32>, fit: FitMode) -> u32 {
    let scaled = ((length as f64 * scale).round() as u32).max(1);
    match (fit, bound) {
        // Rounding must never push an inside-fit past its box.
        (FitMode::Inside, Some(b)) => scaled.min(b.max(1)),
        _ => scaled,
    }
}

/// Percentage of bytes saved, rounded to one decimal place.
///
/// Negative when the optimized file is larger. An empty original yields 0.
pub fn compression_ratio(original_size: u64, optimized_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let saved = original_size as f64 - optimized_size as f64;
    let ratio = saved / original_size as f64 * 100.0;
    (ratio * 10.0).round() / 10.0
}
