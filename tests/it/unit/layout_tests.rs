//! Height Policy, Position Allocator, Camera Reconciler and resize rules.

use cardboard::layout::{
    CameraLimits, Measurements, center_on, compute_height, exceeds_damping, find_position, height_bounds, pan_by,
    resize, width_bounds,
};
use cardboard::types::{Bounds, Camera, CardKind};

fn all_measurements() -> Vec<Measurements> {
    let mut out = Vec::new();
    for visible_rows in [0, 1, 5, 10, 10_000] {
        for multi_sheet in [false, true] {
            for enhancing in [false, true] {
                out.push(Measurements::Table {
                    visible_rows,
                    multi_sheet,
                    enhancing,
                });
            }
        }
    }
    for h in [None, Some(-50.0), Some(0.0), Some(300.0), Some(5000.0), Some(f32::NAN), Some(f32::INFINITY)] {
        out.push(Measurements::Pdf { page_height: h });
        out.push(Measurements::Image { image_height: h });
    }
    for has_preview in [false, true] {
        for has_summary in [false, true] {
            for is_loading in [false, true] {
                out.push(Measurements::Link {
                    has_preview,
                    has_summary,
                    is_loading,
                });
            }
        }
    }
    out.push(Measurements::Video);
    out
}

// ============================================================================
// Height Policy
// ============================================================================

#[test]
fn test_height_is_idempotent() {
    for m in all_measurements() {
        assert_eq!(compute_height(&m), compute_height(&m), "{m:?}");
    }
}

#[test]
fn test_height_is_bounded() {
    for m in all_measurements() {
        let (min, max) = height_bounds(m.kind());
        let h = compute_height(&m);
        assert!(min <= h && h <= max, "{m:?} gave {h}");
    }
}

#[test]
fn test_link_height_grows_with_preview_and_summary() {
    let bare = compute_height(&Measurements::Link {
        has_preview: false,
        has_summary: false,
        is_loading: false,
    });
    let full = compute_height(&Measurements::Link {
        has_preview: true,
        has_summary: true,
        is_loading: false,
    });
    assert_eq!(bare, 180.0);
    assert_eq!(full, 405.0);
}

#[test]
fn test_damping_threshold_is_inclusive() {
    assert!(!exceeds_damping(400.0, 410.0, 10.0));
    assert!(exceeds_damping(400.0, 410.5, 10.0));
    assert!(!exceeds_damping(400.0, 395.0, 5.0));
}

// ============================================================================
// Position Allocator
// ============================================================================

#[test]
fn test_second_allocation_never_overlaps_first() {
    let vp = Bounds::new(-300.0, 120.0, 1600.0, 900.0);
    for size in [(1600.0, 650.0), (400.0, 300.0), (560.0, 315.0)] {
        let first_pos = find_position(&[], Some(vp), size, 80.0);
        let first = Bounds::new(first_pos.0, first_pos.1, size.0, size.1);
        let second_pos = find_position(&[first], Some(vp), (800.0, 600.0), 80.0);
        let second = Bounds::new(second_pos.0, second_pos.1, 800.0, 600.0);
        assert!(!first.overlaps_x(&second));
        assert_eq!(second_pos, (first.right() + 80.0, first.y));
    }
}

#[test]
fn test_no_viewport_falls_back_to_origin() {
    assert_eq!(find_position(&[], None, (400.0, 300.0), 80.0), (0.0, 0.0));
}

#[test]
fn test_rightmost_edge_not_last_card() {
    let cards = [
        Bounds::new(0.0, 10.0, 1000.0, 100.0),
        Bounds::new(100.0, 500.0, 100.0, 100.0),
    ];
    assert_eq!(find_position(&cards, None, (10.0, 10.0), 80.0), (1080.0, 10.0));
}

// ============================================================================
// Camera Reconciler
// ============================================================================

#[test]
fn test_pan_sign_convention() {
    let cam = pan_by(Camera::default(), 250.0, -40.0);
    assert_eq!(cam.x, 250.0);
    assert_eq!(cam.y, -40.0);
    // Visible origin moved left and down in page space
    assert_eq!((-cam.x, -cam.y), (-250.0, 40.0));
}

#[test]
fn test_centred_target_is_a_noop() {
    let limits = CameraLimits::default();
    let target = Bounds::new(700.0, 400.0, 200.0, 100.0);
    assert_eq!(center_on((1600.0, 900.0), Camera::default(), target, &limits), None);
}

#[test]
fn test_small_offset_within_fraction_is_a_noop() {
    let limits = CameraLimits::default();
    // Centre is 50 units off; 10% of 900 is 90
    let target = Bounds::new(750.0, 400.0, 200.0, 100.0);
    assert_eq!(center_on((1600.0, 900.0), Camera::default(), target, &limits), None);
}

#[test]
fn test_far_target_is_centred_at_same_zoom() {
    let limits = CameraLimits::default();
    let target = Bounds::new(3000.0, 0.0, 400.0, 300.0);
    let mv = center_on((1600.0, 900.0), Camera::default(), target, &limits).unwrap();
    assert_eq!(mv.camera.zoom, 1.0);
    assert_eq!(mv.animate_ms, limits.animate_ms);
    let (cx, cy) = target.center();
    assert_eq!(((cx + mv.camera.x) * mv.camera.zoom), 800.0);
    assert_eq!(((cy + mv.camera.y) * mv.camera.zoom), 450.0);
}

#[test]
fn test_oversized_target_zooms_out_only() {
    let limits = CameraLimits::default();
    let target = Bounds::new(0.0, 0.0, 3200.0, 650.0);
    let mv = center_on((1600.0, 900.0), Camera::default(), target, &limits).unwrap();
    assert!(mv.camera.zoom < 1.0);
    assert!((mv.camera.zoom - 1600.0 / 3280.0).abs() < 1e-4);

    let zoomed_out = Camera { zoom: 0.2, ..Camera::default() };
    let small = Bounds::new(0.0, 0.0, 100.0, 100.0);
    if let Some(mv) = center_on((1600.0, 900.0), zoomed_out, small, &limits) {
        assert_eq!(mv.camera.zoom, 0.2);
    }
}

#[test]
fn test_zoom_clamped_to_minimum() {
    let limits = CameraLimits::default();
    let huge = Bounds::new(0.0, 0.0, 1_000_000.0, 100.0);
    let mv = center_on((1600.0, 900.0), Camera::default(), huge, &limits).unwrap();
    assert_eq!(mv.camera.zoom, limits.min_zoom);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_stays_in_bounds() {
    let kinds = [
        CardKind::SpreadsheetTable,
        CardKind::PdfDocument,
        CardKind::Image,
        CardKind::LinkPreview,
        CardKind::VideoEmbed,
    ];
    for kind in kinds {
        let (min_w, max_w) = width_bounds(kind);
        let (min_h, max_h) = height_bounds(kind);
        for scale in [(0.01, 0.01), (0.5, 2.0), (1.0, 1.0), (40.0, 0.3)] {
            let (w, h) = resize(kind, kind.default_size(), scale).unwrap();
            assert!(min_w <= w && w <= max_w, "{kind:?} {scale:?} width {w}");
            assert!(min_h <= h && h <= max_h, "{kind:?} {scale:?} height {h}");
        }
    }
}

#[test]
fn test_resize_rejects_bad_factors() {
    assert_eq!(resize(CardKind::Image, (400.0, 300.0), (0.0, 1.0)), None);
    assert_eq!(resize(CardKind::Image, (400.0, 300.0), (f32::NAN, 1.0)), None);
}
