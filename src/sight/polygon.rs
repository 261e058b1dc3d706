//! Line-of-sight and field-of-view polygons from sorted rays
//!
//! Each ray is clipped at the nearest wall it crosses. The clipped endpoints,
//! taken in ray order, trace the visible region counter-clockwise.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::ray::Ray;
use super::walls::Wall;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SightPolygons {
    /// Everything the rays reach before a wall
    pub los: Vec<DVec2>,
    /// `los` further limited to the vision radius
    pub fov: Vec<DVec2>,
}

impl SightPolygons {
    pub fn is_empty(&self) -> bool {
        self.los.is_empty()
    }

    /// Vertex count across both polygons, the unit fog buffers grow by
    pub fn vertex_count(&self) -> usize {
        self.los.len() + self.fov.len()
    }
}

/// Receives the caster's sorted rays and builds sight polygons
pub trait PolygonConsumer {
    fn consume(&self, rays: &[Ray]) -> SightPolygons;
}

/// Reference consumer clipping rays against wall segments
#[derive(Debug, Clone, Copy)]
pub struct WallClipper<'a> {
    pub walls: &'a [Wall],
    pub fov_radius: f64,
}

impl<'a> WallClipper<'a> {
    pub fn new(walls: &'a [Wall], fov_radius: f64) -> Self {
        Self { walls, fov_radius }
    }

    /// Distance along `ray` to its first wall, or its full length
    pub fn clip(&self, ray: &Ray) -> f64 {
        self.walls
            .iter()
            .filter_map(|w| w.intersect_ray(ray))
            .fold(ray.distance, f64::min)
    }
}

impl PolygonConsumer for WallClipper<'_> {
    fn consume(&self, rays: &[Ray]) -> SightPolygons {
        let mut polygons = SightPolygons {
            los: Vec::with_capacity(rays.len()),
            fov: Vec::with_capacity(rays.len()),
        };
        for ray in rays {
            let t = self.clip(ray);
            polygons.los.push(ray.point_at(t));
            polygons.fov.push(ray.point_at(t.min(self.fov_radius.max(0.0))));
        }
        polygons
    }
}

/// Polygon area by the shoelace formula, positive regardless of winding
pub fn polygon_area(vertices: &[DVec2]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += vertices[i].perp_dot(vertices[j]);
    }
    area.abs() / 2.0
}

/// Even-odd point-in-polygon test
pub fn point_in_polygon(p: DVec2, vertices: &[DVec2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sight::cast::{CastOptions, cast_rays};
    use crate::sight::walls::collect_endpoints;

    fn room() -> Vec<Wall> {
        vec![
            Wall::from_coords([-10.0, -10.0, 10.0, -10.0]),
            Wall::from_coords([10.0, -10.0, 10.0, 10.0]),
            Wall::from_coords([10.0, 10.0, -10.0, 10.0]),
            Wall::from_coords([-10.0, 10.0, -10.0, -10.0]),
        ]
    }

    #[test]
    fn test_closed_room_polygon() {
        let walls = room();
        let endpoints = collect_endpoints(&walls, DVec2::ZERO, 100.0);
        let rays = cast_rays(DVec2::ZERO, 100.0, &endpoints, &CastOptions::default()).unwrap();
        let polygons = WallClipper::new(&walls, 100.0).consume(&rays);

        assert_eq!(polygons.los.len(), rays.len());
        // Every vertex sits on the room boundary
        for p in &polygons.los {
            assert!((p.x.abs().max(p.y.abs()) - 10.0).abs() < 1e-6, "{p:?}");
        }
        assert!((polygon_area(&polygons.los) - 400.0).abs() < 1.0);
        assert!(point_in_polygon(DVec2::new(5.0, 5.0), &polygons.los));
        assert!(!point_in_polygon(DVec2::new(15.0, 0.0), &polygons.los));
    }

    #[test]
    fn test_fov_limited_by_radius() {
        let walls = room();
        let rays = cast_rays(DVec2::ZERO, 100.0, &[], &CastOptions::default()).unwrap();
        let polygons = WallClipper::new(&walls, 4.0).consume(&rays);
        assert!(polygons.fov.iter().all(|p| p.length() <= 4.0 + 1e-9));
        assert!(polygons.los.iter().all(|p| p.length() >= 10.0 - 1e-9));
    }

    #[test]
    fn test_center_ray_closes_cone_at_origin() {
        let options = CastOptions::default().limited(0.0, std::f64::consts::FRAC_PI_2);
        let origin = DVec2::new(3.0, 3.0);
        let rays = cast_rays(origin, 50.0, &[], &options).unwrap();
        let polygons = WallClipper::new(&[], 50.0).consume(&rays);
        assert_eq!(*polygons.los.last().unwrap(), origin);
        // Quarter disc of radius 50, approximated by 6° chords
        let area = polygon_area(&polygons.los);
        let quarter = std::f64::consts::PI * 50.0 * 50.0 / 4.0;
        assert!(area < quarter && area > quarter * 0.95);
    }
}
