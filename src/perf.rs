//! Stage timing utilities.
//!
//! Pipelines wrap their expensive stages (workbook parse, base64 encode,
//! image decode) in a [`ScopedTimer`]. Slow stages are reported at `warn`,
//! the rest at `debug`.
//!
//! ```ignore
//! let _timer = ScopedTimer::new("decode_image", 50.0);
//! // ... work ...
//! ```

use std::time::Instant;
use tracing::{debug, warn};

/// Default threshold before a stage is reported as slow
pub const DEFAULT_STAGE_THRESHOLD_MS: f64 = 100.0;

/// RAII timer that logs its elapsed time on drop.
pub struct ScopedTimer {
    name: &'static str,
    start: Instant,
    threshold_ms: f64,
}

impl ScopedTimer {
    pub fn new(name: &'static str, threshold_ms: f64) -> Self {
        Self {
            name,
            start: Instant::now(),
            threshold_ms,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let ms = self.elapsed_ms();
        if ms > self.threshold_ms {
            warn!("Slow stage: {} took {:.2}ms (threshold {:.0}ms)", self.name, ms, self.threshold_ms);
        } else {
            debug!("{} took {:.2}ms", self.name, ms);
        }
    }
}
