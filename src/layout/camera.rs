//! Camera Reconciler.
//!
//! Coordinate contract: a page point `p` appears on screen at
//! `(p + camera) * zoom`. The visible page rectangle therefore starts at
//! `(-camera.x, -camera.y)`. Moving content right on screen by `d` page units
//! means `camera.x += d`, which moves the viewport origin left by `d`.

use crate::config::BoardConfig;
use crate::store::CardStore;
use crate::types::{Bounds, Camera};
use tracing::debug;

/// Tunables for [`center_on`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraLimits {
    pub recenter_fraction: f32,
    pub padding: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub animate_ms: u64,
}

impl From<&BoardConfig> for CameraLimits {
    fn from(config: &BoardConfig) -> Self {
        Self {
            recenter_fraction: config.recenter_fraction,
            padding: config.camera_padding,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            animate_ms: config.camera_animation_ms,
        }
    }
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self::from(&BoardConfig::default())
    }
}

/// Animated camera transition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMove {
    pub camera: Camera,
    pub animate_ms: u64,
}

/// Shift content on screen by `(dx, dy)` page units.
pub fn pan_by(camera: Camera, dx: f32, dy: f32) -> Camera {
    Camera {
        x: camera.x + dx,
        y: camera.y + dy,
        zoom: camera.zoom,
    }
}

/// Camera that puts page point `point` at the centre of a `screen`-sized
/// viewport at `zoom`.
pub fn camera_centering(screen: (f32, f32), zoom: f32, point: (f32, f32)) -> Camera {
    Camera {
        x: screen.0 / (2.0 * zoom) - point.0,
        y: screen.1 / (2.0 * zoom) - point.1,
        zoom,
    }
}

/// Page-space viewport for a screen size and camera.
pub fn viewport_of(screen: (f32, f32), camera: Camera) -> Bounds {
    Bounds::new(
        -camera.x,
        -camera.y,
        screen.0 / camera.zoom,
        screen.1 / camera.zoom,
    )
}

/// New camera that brings `target` into view, or `None` when it is already
/// substantially centred and fits.
///
/// Zoom only ever decreases.
pub fn center_on(
    screen: (f32, f32),
    camera: Camera,
    target: Bounds,
    limits: &CameraLimits,
) -> Option<CameraMove> {
    if camera.zoom <= 0.0 || screen.0 <= 0.0 || screen.1 <= 0.0 {
        return None;
    }

    let viewport = viewport_of(screen, camera);
    let (vx, vy) = viewport.center();
    let (tx, ty) = target.center();
    let offset = (tx - vx).hypot(ty - vy);
    let needs_pan = offset > limits.recenter_fraction * viewport.width.min(viewport.height);

    let fit_zoom = (screen.0 / (target.width + 2.0 * limits.padding))
        .min(screen.1 / (target.height + 2.0 * limits.padding));
    let needs_zoom = fit_zoom < camera.zoom;

    if !needs_pan && !needs_zoom {
        return None;
    }

    let zoom = if needs_zoom {
        // Tolerates an inverted or NaN range
        fit_zoom
            .max(limits.min_zoom)
            .min(limits.max_zoom)
            .min(camera.zoom)
    } else {
        camera.zoom
    };

    Some(CameraMove {
        camera: camera_centering(screen, zoom, (tx, ty)),
        animate_ms: limits.animate_ms,
    })
}

/// Apply [`center_on`] to the store's camera. Returns whether it moved.
pub fn reconcile<S: CardStore + ?Sized>(store: &S, target: Bounds, limits: &CameraLimits) -> bool {
    let Some(screen) = store.screen_size() else {
        return false;
    };
    match center_on(screen, store.camera(), target, limits) {
        Some(mv) => {
            debug!(x = mv.camera.x, y = mv.camera.y, zoom = mv.camera.zoom, "camera recentre");
            store.set_camera(mv.camera, mv.animate_ms);
            true
        }
        None => false,
    }
}
