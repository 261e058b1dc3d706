//! Occluding wall segments and the endpoints rays are aimed at

use std::collections::HashSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ray::Ray;
use crate::error::{Result, ensure_finite};

const PARALLEL_EPSILON: f64 = 1e-12;

/// A wall between two corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub a: DVec2,
    pub b: DVec2,
}

impl Wall {
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    pub fn from_coords(c: [f64; 4]) -> Self {
        Self::new(DVec2::new(c[0], c[1]), DVec2::new(c[2], c[3]))
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("wall.a.x", self.a.x)?;
        ensure_finite("wall.a.y", self.a.y)?;
        ensure_finite("wall.b.x", self.b.x)?;
        ensure_finite("wall.b.y", self.b.y)?;
        Ok(())
    }

    /// Distance from `p` to the closest point of the segment
    pub fn distance_to(&self, p: DVec2) -> f64 {
        let ab = self.b - self.a;
        let len2 = ab.length_squared();
        if len2 == 0.0 {
            return (p - self.a).length();
        }
        let t = ((p - self.a).dot(ab) / len2).clamp(0.0, 1.0);
        (p - (self.a + ab * t)).length()
    }

    /// Distance along `ray` at which it crosses this wall, if within the ray's length.
    /// Rays parallel to the wall never hit it.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        let d = ray.direction();
        let e = self.b - self.a;
        let denom = d.perp_dot(e);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let w = self.a - ray.origin;
        let t = w.perp_dot(e) / denom;
        let u = w.perp_dot(d) / denom;
        if t < 0.0 || t > ray.distance || !(0.0..=1.0).contains(&u) {
            return None;
        }
        Some(t)
    }
}

/// Distinct wall endpoints within `radius` of `origin`, in first-seen order.
/// Walls that pass through the sight circle contribute both endpoints even if
/// they lie outside it, so rays bracket every wall the viewer can reach.
pub fn collect_endpoints(walls: &[Wall], origin: DVec2, radius: f64) -> Vec<DVec2> {
    let mut seen = HashSet::new();
    let mut out: Vec<DVec2> = Vec::new();
    for wall in walls {
        if wall.distance_to(origin) > radius {
            continue;
        }
        for p in [wall.a, wall.b] {
            // -0.0 and 0.0 name the same corner
            let key = ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits());
            if seen.insert(key) {
                out.push(p);
            }
        }
    }
    out
}
