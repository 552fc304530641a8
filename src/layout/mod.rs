//! Pure layout policies: card height, resize, new-card placement and camera
//! moves.

pub mod camera;
pub mod height;
pub mod placement;
pub mod resize;

pub use camera::{CameraLimits, CameraMove, center_on, pan_by, reconcile};
pub use height::{Measurements, clamp_height, compute_height, exceeds_damping, height_bounds};
pub use placement::find_position;
pub use resize::{resize, width_bounds};
