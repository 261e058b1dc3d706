//! Turning configuration into a concrete cast
//!
//! The host asks for sight at some radius; the plan applies the vision cap,
//! picks density and dedup tolerance from settings, and chooses which caster
//! runs.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::angles::Tolerance;
use super::cast::{AngleWindow, BaselineCaster, CastOptions, RayCaster, TunedCaster};
use super::polygon::{PolygonConsumer, SightPolygons, WallClipper};
use super::ray::Ray;
use super::walls::{Wall, collect_endpoints};
use crate::consts::{BASELINE_RAY_DENSITY, HOST_EXACT_VISION_THRESHOLD};
use crate::error::{Result, ensure_finite};
use crate::settings::{SceneDimensions, SettingKey, SettingsProvider};

/// A vision source asking for sight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SightRequest {
    pub origin: DVec2,
    /// Requested sight distance in pixels, before the vision cap
    pub radius: f64,
    /// Field-of-view radius; defaults to the capped sight distance
    #[serde(default)]
    pub fov_radius: Option<f64>,
    /// Cone limits for directional sources
    #[serde(default)]
    pub angle: Option<AngleWindow>,
}

impl SightRequest {
    pub fn new(origin: DVec2, radius: f64) -> Self {
        Self {
            origin,
            radius,
            fov_radius: None,
            angle: None,
        }
    }

    pub fn with_cone(mut self, window: AngleWindow) -> Self {
        self.angle = Some(window);
        self
    }
}

/// Effective parameters for one sight computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SightPlan {
    /// Sight distance after the vision cap
    pub distance: f64,
    /// Fill ray spacing in degrees
    pub density: f64,
    pub tolerance: Tolerance,
    /// Wall count above which the host computes approximate vision
    pub exact_vision_threshold: usize,
    pub approximate: bool,
    /// Host should not cull walls by distance when this is set
    pub disable_wall_culling: bool,
}

impl SightPlan {
    pub fn resolve<P: SettingsProvider + ?Sized>(
        provider: &P,
        dims: &SceneDimensions,
        requested: f64,
        wall_count: usize,
    ) -> Self {
        let max_radius = provider.number(SettingKey::MaxRadius);
        let distance = effective_distance(requested, max_radius, dims);

        let density = match provider.number(SettingKey::RayDensity) {
            d if d > 0.0 => d,
            d => {
                if d < 0.0 {
                    log::warn!("Negative ray density {}; using baseline", d);
                }
                BASELINE_RAY_DENSITY
            }
        };

        let tolerance = Tolerance::new(provider.number(SettingKey::RayDedupTolerance));

        let exact_vision_threshold = match provider.number(SettingKey::ExactVisionThreshold) {
            t if t >= 1.0 => t as usize,
            _ => HOST_EXACT_VISION_THRESHOLD,
        };

        Self {
            distance,
            density,
            tolerance,
            exact_vision_threshold,
            approximate: wall_count > exact_vision_threshold,
            disable_wall_culling: provider.flag(SettingKey::FixAggressiveWallCulling),
        }
    }

    pub fn cast_options(&self, window: Option<AngleWindow>) -> CastOptions {
        CastOptions {
            density: self.density,
            tolerance: self.tolerance,
            window,
        }
    }

    /// Tuned caster when a dedup tolerance is configured, pass-through otherwise
    pub fn caster(&self, window: Option<AngleWindow>) -> Box<dyn RayCaster> {
        if self.tolerance.is_enabled() {
            Box::new(TunedCaster {
                options: self.cast_options(window),
            })
        } else {
            Box::new(BaselineCaster {
                density: self.density,
                window,
            })
        }
    }
}

/// Requested distance limited by a `max_radius` cap in grid units (0 = uncapped)
pub fn effective_distance(requested: f64, max_radius: f64, dims: &SceneDimensions) -> f64 {
    if max_radius < 0.0 {
        log::warn!("Negative max radius {}; vision uncapped", max_radius);
        return requested;
    }
    let cap = dims.units_to_pixels(max_radius);
    if cap > 0.0 { requested.min(cap) } else { requested }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SightResult {
    pub plan: SightPlan,
    pub rays: Vec<Ray>,
    pub polygons: SightPolygons,
}

/// Plan, cast and clip sight for one source
pub fn compute_sight<P: SettingsProvider + ?Sized>(
    request: &SightRequest,
    walls: &[Wall],
    provider: &P,
    dims: &SceneDimensions,
) -> Result<SightResult> {
    ensure_finite("origin.x", request.origin.x)?;
    ensure_finite("origin.y", request.origin.y)?;
    ensure_finite("radius", request.radius)?;
    for wall in walls {
        wall.validate()?;
    }

    let plan = SightPlan::resolve(provider, dims, request.radius, walls.len());
    let endpoints = collect_endpoints(walls, request.origin, plan.distance);
    let rays = plan.caster(request.angle).cast(request.origin, plan.distance, &endpoints)?;

    let fov_radius = request.fov_radius.unwrap_or(plan.distance).min(plan.distance);
    let polygons = WallClipper::new(walls, fov_radius).consume(&rays);

    log::debug!(
        "Sight at ({:.1}, {:.1}): distance {:.1}, {} endpoints, {} rays{}",
        request.origin.x,
        request.origin.y,
        plan.distance,
        endpoints.len(),
        rays.len(),
        if plan.approximate { " (approximate)" } else { "" }
    );

    Ok(SightResult { plan, rays, polygons })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LayeredSettings, SceneFlags, WorldSettings};

    #[test]
    fn test_max_radius_caps_distance() {
        let dims = SceneDimensions { size: 100.0, distance: 5.0 };
        assert_eq!(effective_distance(1000.0, 30.0, &dims), 600.0);
        assert_eq!(effective_distance(200.0, 30.0, &dims), 200.0);
        assert_eq!(effective_distance(1000.0, 0.0, &dims), 1000.0);
        assert_eq!(effective_distance(1000.0, -3.0, &dims), 1000.0);
    }

    #[test]
    fn test_defaults_resolve_to_baseline() {
        let world = WorldSettings::default();
        let plan = SightPlan::resolve(&world, &SceneDimensions::default(), 300.0, 10);
        assert_eq!(plan.distance, 300.0);
        assert_eq!(plan.density, BASELINE_RAY_DENSITY);
        assert!(!plan.tolerance.is_enabled());
        assert_eq!(plan.exact_vision_threshold, HOST_EXACT_VISION_THRESHOLD);
        assert!(!plan.approximate);
        assert!(!plan.disable_wall_culling);
    }

    #[test]
    fn test_overrides_and_soft_failures() {
        let world = WorldSettings {
            ray_density: -4.0,
            ray_dedup_tolerance: -10.0,
            exact_vision_threshold: 20.0,
            ..Default::default()
        };
        let mut scene = SceneFlags::new();
        scene.set(SettingKey::MaxRadius, 2);

        let provider = LayeredSettings::new(Some(&scene), Some(&world));
        let plan = SightPlan::resolve(&provider, &SceneDimensions::default(), 1000.0, 21);
        assert_eq!(plan.distance, 40.0);
        assert_eq!(plan.density, BASELINE_RAY_DENSITY);
        assert!(!plan.tolerance.is_enabled());
        assert_eq!(plan.exact_vision_threshold, 20);
        assert!(plan.approximate);
    }

    #[test]
    fn test_compute_sight_in_room() {
        let walls = [
            Wall::from_coords([0.0, 0.0, 200.0, 0.0]),
            Wall::from_coords([200.0, 0.0, 200.0, 200.0]),
            Wall::from_coords([200.0, 200.0, 0.0, 200.0]),
            Wall::from_coords([0.0, 200.0, 0.0, 0.0]),
        ];
        let world = WorldSettings {
            ray_dedup_tolerance: 50.0,
            ray_density: 10.0,
            ..Default::default()
        };
        let request = SightRequest::new(DVec2::new(100.0, 100.0), 1000.0);
        let result = compute_sight(&request, &walls, &world, &SceneDimensions::default()).unwrap();

        assert!(result.plan.tolerance.is_enabled());
        assert!(!result.rays.is_empty());
        assert!(result.rays.windows(2).all(|w| w[0].angle <= w[1].angle));
        for p in &result.polygons.los {
            assert!(p.x > -1e-6 && p.x < 200.0 + 1e-6 && p.y > -1e-6 && p.y < 200.0 + 1e-6);
        }
    }

    #[test]
    fn test_compute_sight_rejects_bad_wall() {
        let walls = [Wall::from_coords([0.0, 0.0, f64::NAN, 1.0])];
        let request = SightRequest::new(DVec2::ZERO, 10.0);
        let result = compute_sight(&request, &walls, &WorldSettings::default(), &SceneDimensions::default());
        assert!(result.is_err());
    }
}
