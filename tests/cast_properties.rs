use std::collections::HashSet;
use std::f64::consts::TAU;

use glam::DVec2;
use proptest::prelude::*;
use vision_tweaks::sight::{CastOptions, RayKind, cast_rays};

fn point() -> impl Strategy<Value = DVec2> {
    (-500.0f64..500.0, -500.0f64..500.0).prop_map(|(x, y)| DVec2::new(x, y))
}

fn cone() -> impl Strategy<Value = Option<(f64, f64)>> {
    prop_oneof![
        Just(None),
        (-TAU..TAU, 0.1f64..6.0).prop_map(|(min, width)| Some((min, min + width))),
    ]
}

fn options(density: f64, tolerance: f64, window: Option<(f64, f64)>) -> CastOptions {
    let options = CastOptions::default().with_density(density).with_tolerance(tolerance);
    match window {
        Some((min, max)) => options.limited(min, max),
        None => options,
    }
}

proptest! {
    #[test]
    fn rays_are_sorted(
        origin in point(),
        endpoints in prop::collection::vec(point(), 0..40),
        distance in 0.0f64..2000.0,
        density in 0.0f64..45.0,
        tolerance in 0.0f64..100.0,
        window in cone(),
    ) {
        let rays = cast_rays(origin, distance, &endpoints, &options(density, tolerance, window)).unwrap();
        for pair in rays.windows(2) {
            prop_assert!(pair[0].angle <= pair[1].angle);
        }
        prop_assert!(rays.iter().all(|r| r.angle.is_finite()));
    }

    #[test]
    fn buckets_are_unique(
        origin in point(),
        endpoints in prop::collection::vec(point(), 0..40),
        density in 0.0f64..45.0,
        tolerance in 1.0f64..100.0,
        window in cone(),
    ) {
        let rays = cast_rays(origin, 300.0, &endpoints, &options(density, tolerance, window)).unwrap();
        // Cone rays are forced in; everything else must claim a fresh bucket
        let mut seen = HashSet::new();
        for ray in rays.iter().filter(|r| !matches!(r.kind, RayKind::Boundary | RayKind::Center)) {
            prop_assert!(seen.insert((ray.angle * tolerance).round() as i64));
        }
        for ray in rays.iter().filter(|r| matches!(r.kind, RayKind::Boundary | RayKind::Center)) {
            prop_assert!(!seen.contains(&((ray.angle * tolerance).round() as i64)));
        }
    }

    #[test]
    fn no_dedup_count_formula(
        origin in point(),
        endpoints in prop::collection::vec(point(), 0..40),
        density in prop_oneof![Just(0.0), 1.0f64..90.0],
        window in cone(),
    ) {
        let rays = cast_rays(origin, 300.0, &endpoints, &options(density, 0.0, window)).unwrap();

        let retained = rays.iter().filter(|r| r.kind == RayKind::Endpoint).count();
        let fill = rays.iter().filter(|r| r.kind == RayKind::Fill).count();
        let cone_rays = if window.is_some() { 3 } else { 0 };
        prop_assert_eq!(rays.len(), 3 * retained + fill + cone_rays);
        if window.is_none() {
            prop_assert_eq!(retained, endpoints.len());
        }
        if density > 0.0 {
            let span = window.map_or(TAU, |(min, max)| max - min);
            let expected = (span / density.to_radians()).ceil() as usize;
            prop_assert!(fill == expected || fill + 1 == expected);
        } else {
            prop_assert_eq!(fill, 0);
        }
    }

    #[test]
    fn fill_bounds_angular_gaps(
        origin in point(),
        endpoints in prop::collection::vec(point(), 0..40),
        density in 1.0f64..45.0,
        tolerance in prop_oneof![Just(0.0), 1.0f64..100.0],
        window in cone(),
    ) {
        let rays = cast_rays(origin, 300.0, &endpoints, &options(density, tolerance, window)).unwrap();

        // A dropped ray's bucket is held by a kept ray less than one bucket
        // width away, so each gap can stretch by a width at both ends
        let slack = if tolerance > 0.0 { 2.0 / tolerance } else { 0.0 };
        let bound = density.to_radians() + slack + 1e-9;

        let angles: Vec<f64> = match window {
            Some((min, max)) => rays
                .iter()
                .filter(|r| r.kind != RayKind::Center && r.angle >= min && r.angle <= max)
                .map(|r| r.angle)
                .collect(),
            None => rays.iter().map(|r| r.angle).collect(),
        };
        prop_assert!(!angles.is_empty());
        for pair in angles.windows(2) {
            prop_assert!(pair[1] - pair[0] <= bound, "gap {} > {}", pair[1] - pair[0], bound);
        }
        match window {
            Some((min, max)) => {
                prop_assert_eq!(angles[0], min);
                prop_assert_eq!(angles[angles.len() - 1], max);
            }
            None => {
                let wrap = angles[0] + TAU - angles[angles.len() - 1];
                prop_assert!(wrap <= bound, "wrap gap {} > {}", wrap, bound);
            }
        }
    }

    #[test]
    fn casting_is_idempotent(
        origin in point(),
        endpoints in prop::collection::vec(point(), 0..20),
        density in 0.0f64..45.0,
        tolerance in 0.0f64..100.0,
        window in cone(),
    ) {
        let opts = options(density, tolerance, window);
        let first = cast_rays(origin, 250.0, &endpoints, &opts).unwrap();
        let second = cast_rays(origin, 250.0, &endpoints, &opts).unwrap();
        prop_assert_eq!(first, second);
    }
}
