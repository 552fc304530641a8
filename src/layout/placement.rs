//! Position Allocator for new cards.
//!
//! Cards are laid out in a left-to-right row: a new card goes `gap` units to
//! the right of the rightmost existing edge, on the first card's baseline.

use crate::types::Bounds;

/// Top-left for a new card of `size`.
///
/// With no existing cards the card is centred in `viewport`, or placed at the
/// origin when the viewport is unknown. The result never overlaps an existing
/// card along the X axis.
pub fn find_position(
    existing: &[Bounds],
    viewport: Option<Bounds>,
    size: (f32, f32),
    gap: f32,
) -> (f32, f32) {
    let Some(first) = existing.first() else {
        return match viewport {
            Some(vp) => (
                vp.x + (vp.width - size.0) / 2.0,
                vp.y + (vp.height - size.1) / 2.0,
            ),
            None => (0.0, 0.0),
        };
    };

    let rightmost = existing
        .iter()
        .map(Bounds::right)
        .fold(f32::NEG_INFINITY, f32::max);

    (rightmost + gap.max(0.0), first.y)
}
