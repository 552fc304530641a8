//! Resize rules for user-dragged card handles.

use super::height::height_bounds;
use crate::constants::*;
use crate::types::CardKind;

/// `(min, max)` width for a card kind.
pub fn width_bounds(kind: CardKind) -> (f32, f32) {
    match kind {
        CardKind::SpreadsheetTable => TABLE_WIDTH_BOUNDS,
        CardKind::PdfDocument => PDF_WIDTH_BOUNDS,
        CardKind::Image => IMAGE_WIDTH_BOUNDS,
        CardKind::LinkPreview => LINK_WIDTH_BOUNDS,
        CardKind::VideoEmbed => VIDEO_WIDTH_BOUNDS,
    }
}

/// Width:height ratio kept while resizing, for kinds that have one.
pub fn aspect_ratio(kind: CardKind) -> Option<f32> {
    match kind {
        CardKind::SpreadsheetTable => Some(TABLE_ASPECT_RATIO),
        CardKind::PdfDocument => Some(PDF_ASPECT_RATIO),
        _ => None,
    }
}

/// New size for a card of `kind` currently `size`, scaled by `scale`.
///
/// Fixed-ratio kinds follow the larger scale factor. When the ratio-derived
/// height exceeds the kind's maximum, the width is recomputed from the
/// clamped height. Returns `None` for non-positive or non-finite factors.
pub fn resize(kind: CardKind, size: (f32, f32), scale: (f32, f32)) -> Option<(f32, f32)> {
    let (sx, sy) = scale;
    if !(sx.is_finite() && sy.is_finite()) || sx <= 0.0 || sy <= 0.0 {
        return None;
    }

    let (min_w, max_w) = width_bounds(kind);
    let (min_h, max_h) = height_bounds(kind);

    let Some(ratio) = aspect_ratio(kind) else {
        return Some((
            (size.0 * sx).clamp(min_w, max_w),
            (size.1 * sy).clamp(min_h, max_h),
        ));
    };

    let scale = sx.max(sy);
    let width = size.0 * scale;
    let height = width / ratio;

    if height > max_h {
        return Some(((max_h * ratio).clamp(min_w, max_w), max_h));
    }
    Some((width.clamp(min_w, max_w), height.clamp(min_h, max_h)))
}
