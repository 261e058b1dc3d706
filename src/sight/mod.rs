//! Sight computation
//!
//! Pure and re-entrant: every call owns its rays and dedup state, so
//! different sources can be computed concurrently.
//! - `cast`: the ray caster and its strategies
//! - `plan`: settings -> effective cast parameters
//! - `walls` / `polygon`: endpoint derivation and wall clipping

pub mod angles;
pub mod cast;
pub mod plan;
pub mod polygon;
pub mod ray;
pub mod walls;

pub use angles::{AngleSet, Tolerance};
pub use cast::{AngleWindow, BaselineCaster, CastOptions, RayCaster, TunedCaster, cast_rays};
pub use plan::{SightPlan, SightRequest, SightResult, compute_sight, effective_distance};
pub use polygon::{PolygonConsumer, SightPolygons, WallClipper, point_in_polygon, polygon_area};
pub use ray::{Ray, RayKind};
pub use walls::{Wall, collect_endpoints};
