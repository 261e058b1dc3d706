//! Vision Tweaks - tunable ray-cast visibility
//!
//! Core modules:
//! - `sight`: Ray casting, dedup, wall clipping and sight planning
//! - `settings`: Two-tier (scene over world) tunable resolution
//! - `fog`: Fog-of-war commit policy around computed sight polygons
//! - `error`: Crate error type

pub mod error;
pub mod fog;
pub mod settings;
pub mod sight;

pub use error::{Result, VisionError};
pub use settings::{LayeredSettings, SceneDimensions, SceneFlags, SettingKey, SettingsProvider, WorldSettings};
pub use sight::{CastOptions, Ray, RayKind, cast_rays, compute_sight};

use glam::DVec2;
use std::f64::consts::TAU;

/// Host and tuning constants
pub mod consts {
    /// Host ray density in degrees (used when no override is configured)
    pub const BASELINE_RAY_DENSITY: f64 = 6.0;
    /// Dedup tolerance the host uses internally, reported for reference only
    pub const HOST_RAY_DEDUP_TOLERANCE: f64 = 50.0;
    /// Wall count at which the host switches to approximate vision
    pub const HOST_EXACT_VISION_THRESHOLD: usize = 500;
    /// Angular offset (radians) of the straddling rays around a wall endpoint
    pub const STRADDLE_OFFSET: f64 = 0.02;
    /// Pending fog geometry length that forces a commit when the leak fix is on
    pub const DEFAULT_FOG_COMMIT_THRESHOLD: usize = 4000;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if a >= TAU { 0.0 } else { a }
}

/// Unwrap `angle` into [a_min, a_min + 2π) so it can be compared against a window
#[inline]
pub fn adjust_angle(a_min: f64, angle: f64) -> f64 {
    a_min + normalize_angle(angle - a_min)
}

/// Direction angle from `from` towards `to`, normalized to [0, 2π).
/// Coincident points have no direction and report 0.
#[inline]
pub fn angle_between(from: DVec2, to: DVec2) -> f64 {
    let d = to - from;
    if d.x == 0.0 && d.y == 0.0 {
        return 0.0;
    }
    normalize_angle(d.y.atan2(d.x))
}

/// Convert polar (r, theta) around `origin` to cartesian
#[inline]
pub fn polar_to_cartesian(origin: DVec2, r: f64, theta: f64) -> DVec2 {
    origin + DVec2::new(r * theta.cos(), r * theta.sin())
}
