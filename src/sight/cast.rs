//! Ray casting with adaptive density and angular deduplication
//!
//! Candidate rays are emitted in priority order:
//! 1. Cone boundary and centre rays (limited casts only, never deduplicated)
//! 2. One ray straight at each wall endpoint inside the cone
//! 3. Two straddling rays bracketing each endpoint ray
//! 4. Fill rays every `density` degrees across the cone
//!
//! Every candidate after step 1 passes the angle-bucket filter, and the
//! result is sorted counter-clockwise for polygon construction.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::angles::{AngleSet, Tolerance};
use super::ray::{Ray, RayKind};
use crate::consts::{BASELINE_RAY_DENSITY, STRADDLE_OFFSET};
use crate::error::{Result, ensure_finite};
use crate::{adjust_angle, normalize_angle};

/// Smallest usable fill spacing in degrees (7200 rays per full circle)
pub const MIN_RAY_DENSITY: f64 = 0.05;

/// Angular limits of a cone cast, in radians, with `min <= max <= min + 2π`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleWindow {
    pub min: f64,
    pub max: f64,
}

impl AngleWindow {
    /// Build a window; a `max` below `min` is unwrapped forward and spans wider
    /// than a full turn are clamped to one turn.
    pub fn new(min: f64, max: f64) -> Self {
        let mut max = max;
        if min.is_finite() && max.is_finite() {
            if max < min {
                log::warn!("Angle window max {} below min {}; unwrapping", max, min);
                max = adjust_angle(min, max);
            }
            if max - min > TAU {
                max = min + TAU;
            }
        }
        Self { min, max }
    }

    /// Cone of `width` radians centred on `facing`
    pub fn centered(facing: f64, width: f64) -> Self {
        let half = width.clamp(0.0, TAU) / 2.0;
        Self::new(facing - half, facing + half)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Canonical form of `angle` relative to this window
    #[inline]
    pub fn adjust(&self, angle: f64) -> f64 {
        adjust_angle(self.min, angle)
    }

    /// Whether an already-adjusted angle lies inside the window (inclusive)
    #[inline]
    pub fn contains(&self, adjusted: f64) -> bool {
        adjusted >= self.min && adjusted <= self.max
    }

    /// Bisector of the window turned half a revolution
    pub fn center_opposite(&self) -> f64 {
        self.min + self.width() / 2.0 + PI
    }
}

/// Tunables for one cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastOptions {
    /// Degrees between fill rays; 0 disables filling
    pub density: f64,
    pub tolerance: Tolerance,
    /// Present only for cone-limited sources
    pub window: Option<AngleWindow>,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            density: BASELINE_RAY_DENSITY,
            tolerance: Tolerance::DISABLED,
            window: None,
        }
    }
}

impl CastOptions {
    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Tolerance::new(tolerance);
        self
    }

    pub fn limited(mut self, min: f64, max: f64) -> Self {
        self.window = Some(AngleWindow::new(min, max));
        self
    }

    /// Fill spacing in radians, or None when filling is off
    fn fill_step(&self) -> Option<f64> {
        let d = self.density;
        if d == 0.0 {
            return None;
        }
        if !d.is_finite() || d < 0.0 {
            log::warn!("Ray density {} is not usable; fill rays disabled", d);
            return None;
        }
        if d < MIN_RAY_DENSITY {
            log::warn!("Ray density {} below {}; clamping", d, MIN_RAY_DENSITY);
            return Some(MIN_RAY_DENSITY.to_radians());
        }
        Some(d.to_radians())
    }
}

/// Collects candidates, filtering them through the angle buckets
struct Emitter {
    angles: AngleSet,
    rays: Vec<Ray>,
    candidates: usize,
}

impl Emitter {
    fn new(tolerance: Tolerance) -> Self {
        Self {
            angles: AngleSet::new(tolerance),
            rays: Vec::new(),
            candidates: 0,
        }
    }

    /// Returns whether the ray was kept
    fn cast(&mut self, ray: Ray) -> bool {
        self.candidates += 1;
        let kept = self.angles.insert(ray.angle);
        if kept {
            self.rays.push(ray);
        }
        kept
    }

    fn force(&mut self, ray: Ray) {
        self.candidates += 1;
        self.angles.reserve(ray.angle);
        self.rays.push(ray);
    }
}

fn validate(origin: DVec2, distance: f64, endpoints: &[DVec2], options: &CastOptions) -> Result<()> {
    ensure_finite("origin.x", origin.x)?;
    ensure_finite("origin.y", origin.y)?;
    ensure_finite("distance", distance)?;
    for e in endpoints {
        ensure_finite("endpoint.x", e.x)?;
        ensure_finite("endpoint.y", e.y)?;
    }
    if let Some(w) = options.window {
        ensure_finite("angle window min", w.min)?;
        ensure_finite("angle window max", w.max)?;
    }
    Ok(())
}

/// Cast sight rays from `origin` out to `distance`.
///
/// Returns rays sorted by non-decreasing angle. With a non-zero tolerance no
/// two returned rays share an angle bucket, except that the three rays of a
/// limited cone are always kept. Fails only on non-finite input, in which
/// case nothing is computed.
pub fn cast_rays(origin: DVec2, distance: f64, endpoints: &[DVec2], options: &CastOptions) -> Result<Vec<Ray>> {
    validate(origin, distance, endpoints, options)?;

    let distance = if distance < 0.0 {
        log::warn!("Negative sight distance {}; using 0", distance);
        0.0
    } else {
        distance
    };
    let window = options.window;
    let mut out = Emitter::new(options.tolerance);

    // Cone limits and the centre closure ray
    if let Some(w) = window {
        out.force(Ray::from_angle(origin, w.min, distance, RayKind::Boundary));
        out.force(Ray::from_angle(origin, w.center_opposite(), 0.0, RayKind::Center));
        out.force(Ray::from_angle(origin, w.max, distance, RayKind::Boundary));
    }

    // Endpoint rays
    let mut direct = Vec::with_capacity(endpoints.len());
    for &e in endpoints {
        let mut ray = Ray::towards(origin, e, distance);
        if let Some(w) = window {
            ray.angle = w.adjust(ray.angle);
            if !w.contains(ray.angle) {
                continue;
            }
        }
        if out.cast(ray) {
            direct.push(ray);
        }
    }

    // Straddles around the endpoint rays that survived dedup
    for ray in &direct {
        for offset in [STRADDLE_OFFSET, -STRADDLE_OFFSET] {
            let mut s = ray.shift_angle(offset);
            if window.is_none() {
                s.angle = normalize_angle(s.angle);
            }
            out.cast(s);
        }
    }

    // Fill
    if let Some(step) = options.fill_step() {
        let (start, span) = window.map_or((0.0, TAU), |w| (w.min, w.width()));
        // Shave float noise so exact multiples (360 / 90) don't gain a ray
        let n = (span / step - 1e-9).ceil().max(0.0) as usize;
        for i in 0..n {
            let a = start + i as f64 * step;
            let a = if window.is_none() { normalize_angle(a) } else { a };
            out.cast(Ray::from_angle(origin, a, distance, RayKind::Fill));
        }
    }

    let Emitter {
        mut rays, candidates, ..
    } = out;
    rays.sort_by(|a, b| a.angle.total_cmp(&b.angle));

    log::debug!(
        "Cast {} rays ({} candidates, {} endpoints, tolerance {})",
        rays.len(),
        candidates,
        endpoints.len(),
        options.tolerance.value()
    );
    Ok(rays)
}

/// Strategy the surrounding system picks from configuration
pub trait RayCaster {
    fn cast(&self, origin: DVec2, distance: f64, endpoints: &[DVec2]) -> Result<Vec<Ray>>;
}

/// Caster with the configured dedup tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunedCaster {
    pub options: CastOptions,
}

impl RayCaster for TunedCaster {
    fn cast(&self, origin: DVec2, distance: f64, endpoints: &[DVec2]) -> Result<Vec<Ray>> {
        cast_rays(origin, distance, endpoints, &self.options)
    }
}

/// Pass-through caster: every candidate is kept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineCaster {
    pub density: f64,
    pub window: Option<AngleWindow>,
}

impl RayCaster for BaselineCaster {
    fn cast(&self, origin: DVec2, distance: f64, endpoints: &[DVec2]) -> Result<Vec<Ray>> {
        let options = CastOptions {
            density: self.density,
            tolerance: Tolerance::DISABLED,
            window: self.window,
        };
        cast_rays(origin, distance, endpoints, &options)
    }
}
