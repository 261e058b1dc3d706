//! Sight rays cast from a viewpoint
//!
//! A ray is stored in polar form around its origin: direction angle plus
//! distance. Angles are in [0, 2π) for full-circle casts and unwrapped into
//! [a_min, a_min + 2π) when the cast is limited to a cone.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::{angle_between, polar_to_cartesian};

/// Why a ray was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RayKind {
    /// Aimed directly at a wall endpoint
    Endpoint,
    /// Offset slightly to either side of an endpoint ray
    Straddle,
    /// Edge of a limited cone
    Boundary,
    /// Zero-length ray opposite the cone centre, closes cone polygons at the origin
    Center,
    /// Fill ray guaranteeing the configured angular density
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: DVec2,
    /// Direction in radians
    pub angle: f64,
    pub distance: f64,
    pub kind: RayKind,
}

impl Ray {
    pub fn from_angle(origin: DVec2, angle: f64, distance: f64, kind: RayKind) -> Self {
        Self {
            origin,
            angle,
            distance,
            kind,
        }
    }

    /// Ray from `origin` aimed at `target`, `distance` long regardless of how far the target is
    pub fn towards(origin: DVec2, target: DVec2, distance: f64) -> Self {
        Self::from_angle(origin, angle_between(origin, target), distance, RayKind::Endpoint)
    }

    /// Copy of this ray rotated by `offset` radians, without re-wrapping the angle
    pub fn shift_angle(&self, offset: f64) -> Self {
        Self {
            angle: self.angle + offset,
            kind: RayKind::Straddle,
            ..*self
        }
    }

    /// Unit direction vector
    #[inline]
    pub fn direction(&self) -> DVec2 {
        DVec2::new(self.angle.cos(), self.angle.sin())
    }

    /// Far end of the ray
    #[inline]
    pub fn end(&self) -> DVec2 {
        polar_to_cartesian(self.origin, self.distance, self.angle)
    }

    /// Point at `t` units along the ray
    #[inline]
    pub fn point_at(&self, t: f64) -> DVec2 {
        self.origin + self.direction() * t
    }

    pub fn is_center(&self) -> bool {
        self.kind == RayKind::Center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_towards_sets_angle_and_distance() {
        let ray = Ray::towards(DVec2::new(10.0, 10.0), DVec2::new(10.0, 20.0), 50.0);
        assert!((ray.angle - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(ray.distance, 50.0);
        let end = ray.end();
        assert!((end - DVec2::new(10.0, 60.0)).length() < 1e-9);
    }

    #[test]
    fn test_towards_behind_origin_wraps_positive() {
        let ray = Ray::towards(DVec2::ZERO, DVec2::new(-1.0, -1.0), 1.0);
        assert!((ray.angle - 1.25 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_towards_coincident_point() {
        let ray = Ray::towards(DVec2::ZERO, DVec2::ZERO, 0.0);
        assert_eq!(ray.angle, 0.0);
        assert_eq!(ray.end(), DVec2::ZERO);
    }

    #[test]
    fn test_shift_angle_keeps_origin() {
        let ray = Ray::from_angle(DVec2::new(1.0, 2.0), 0.0, 10.0, RayKind::Endpoint);
        let left = ray.shift_angle(-0.02);
        assert_eq!(left.origin, ray.origin);
        assert_eq!(left.kind, RayKind::Straddle);
        // Not wrapped: continuity with the parent matters for cone windows
        assert!((left.angle + 0.02).abs() < 1e-12);
    }
}
