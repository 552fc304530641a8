//! Height Policy: content measurements to a bounded card height.
//!
//! The policy is pure. The damping rule that keeps a measure/resize cycle
//! from oscillating is applied by the card controller via [`exceeds_damping`].

use crate::constants::*;
use crate::types::CardKind;

/// Kind-specific measurements reported by a card's rendering surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measurements {
    Table {
        visible_rows: usize,
        multi_sheet: bool,
        enhancing: bool,
    },
    /// `None` while the document is still loading
    Pdf { page_height: Option<f32> },
    /// `None` while the image is still loading
    Image { image_height: Option<f32> },
    Link {
        has_preview: bool,
        has_summary: bool,
        is_loading: bool,
    },
    Video,
}

impl Measurements {
    pub fn kind(&self) -> CardKind {
        match self {
            Measurements::Table { .. } => CardKind::SpreadsheetTable,
            Measurements::Pdf { .. } => CardKind::PdfDocument,
            Measurements::Image { .. } => CardKind::Image,
            Measurements::Link { .. } => CardKind::LinkPreview,
            Measurements::Video => CardKind::VideoEmbed,
        }
    }
}

/// `(min, max)` height for a card kind.
pub fn height_bounds(kind: CardKind) -> (f32, f32) {
    match kind {
        CardKind::SpreadsheetTable => TABLE_HEIGHT_BOUNDS,
        CardKind::PdfDocument => PDF_HEIGHT_BOUNDS,
        CardKind::Image => IMAGE_HEIGHT_BOUNDS,
        CardKind::LinkPreview => LINK_HEIGHT_BOUNDS,
        CardKind::VideoEmbed => VIDEO_HEIGHT_BOUNDS,
    }
}

/// Clamp into the kind's bounds; non-finite input maps to the minimum.
pub fn clamp_height(kind: CardKind, height: f32) -> f32 {
    let (min, max) = height_bounds(kind);
    if !height.is_finite() {
        return min;
    }
    height.clamp(min, max)
}

fn raw_estimate(measurements: &Measurements) -> f32 {
    let (min, _) = height_bounds(measurements.kind());
    match *measurements {
        Measurements::Table {
            visible_rows,
            multi_sheet,
            enhancing,
        } => {
            let controls = if multi_sheet { SHEET_CONTROLS_HEIGHT } else { 0.0 };
            let progress = if enhancing { PROGRESS_BAR_HEIGHT } else { 0.0 };
            CARD_HEADER_HEIGHT
                + controls
                + TABLE_HEADER_HEIGHT
                + visible_rows as f32 * TABLE_ROW_HEIGHT
                + progress
                + CARD_PADDING
        }
        Measurements::Pdf { page_height } => page_height
            .map(|h| CARD_HEADER_HEIGHT + h + CARD_PADDING)
            .unwrap_or(min),
        Measurements::Image { image_height } => image_height
            .map(|h| CARD_HEADER_HEIGHT + h + CARD_PADDING)
            .unwrap_or(min),
        Measurements::Link {
            has_preview,
            has_summary,
            is_loading,
        } => {
            if is_loading {
                return min;
            }
            let preview = if has_preview { LINK_PREVIEW_HEIGHT } else { 0.0 };
            let summary = if has_summary { LINK_SUMMARY_HEIGHT } else { 0.0 };
            CARD_HEADER_HEIGHT + preview + summary + CARD_PADDING
        }
        Measurements::Video => VIDEO_DEFAULT_SIZE.1,
    }
}

/// Bounded target height for the measured content.
pub fn compute_height(measurements: &Measurements) -> f32 {
    clamp_height(measurements.kind(), raw_estimate(measurements))
}

/// True when `computed` differs from `stored` by more than `threshold`.
pub fn exceeds_damping(stored: f32, computed: f32, threshold: f32) -> bool {
    (stored - computed).abs() > threshold
}
