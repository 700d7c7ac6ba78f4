//! Field-of-view raycasting.
//!
//! Visibility is a fan of rays: a dense forward cone at full radius plus a
//! sparse rear arc at reduced radius for peripheral awareness. The fan is
//! returned as `[origin, endpoints…]` in angular order; renderers and
//! fog-of-war masks close the polygon themselves.

use engine_core::{Vec2, Vec3};
use std::f32::consts::TAU;

use crate::world::CollisionWorld;

/// Total rays cast per query.
pub const DEFAULT_RAY_BUDGET: usize = 120;
/// Forward cone half-angle (120 degrees).
pub const DEFAULT_CONE_HALF_ANGLE: f32 = 120.0 * std::f32::consts::PI / 180.0;
/// March step for FOV rays; coarser than collision raycasts.
pub const FOV_RAY_STEP: f32 = 0.5;
/// Share of the budget spent on the forward cone.
const FORWARD_RAY_SHARE: f32 = 0.8;
/// Rear-arc radius relative to the forward radius.
const REAR_RADIUS_FACTOR: f32 = 0.3;

/// Tuning for one visibility query.
#[derive(Debug, Clone, Copy)]
pub struct FovConfig {
    pub radius: f32,
    pub half_angle: f32,
    pub ray_budget: usize,
    pub step: f32,
}

impl Default for FovConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            half_angle: DEFAULT_CONE_HALF_ANGLE,
            ray_budget: DEFAULT_RAY_BUDGET,
            step: FOV_RAY_STEP,
        }
    }
}

/// Cast the visibility fan around `origin`.
///
/// With a facing direction, 80% of the budget sweeps the forward cone
/// (endpoints included) at full radius and the rest sweeps the remaining
/// arc at 30% radius. The rear samples sit strictly between the seam
/// angles, so the two arcs tile the circle without gap or double-cast.
/// Without a facing direction the whole budget sweeps a full 360° circle
/// at full radius.
pub fn visibility_polygon(
    world: &CollisionWorld,
    origin: Vec3,
    facing: Option<Vec2>,
    config: &FovConfig,
) -> Vec<Vec2> {
    let mut points = Vec::with_capacity(config.ray_budget + 1);
    points.push(origin.truncate());
    if config.ray_budget == 0 {
        return points;
    }

    let facing = facing.and_then(|f| f.try_normalize());
    match facing {
        Some(dir) => {
            let facing_angle = dir.y.atan2(dir.x);
            let forward_rays =
                ((config.ray_budget as f32 * FORWARD_RAY_SHARE) as usize).max(1);
            let rear_rays = config.ray_budget - forward_rays;
            let forward_span = config.half_angle * 2.0;

            for i in 0..forward_rays {
                let t = if forward_rays == 1 {
                    0.5
                } else {
                    i as f32 / (forward_rays - 1) as f32
                };
                let angle = facing_angle - config.half_angle + t * forward_span;
                points.push(cast_ray(world, origin, angle, config.radius, config.step));
            }

            let rear_span = TAU - forward_span;
            let rear_radius = config.radius * REAR_RADIUS_FACTOR;
            for i in 0..rear_rays {
                let t = (i + 1) as f32 / (rear_rays + 1) as f32;
                let angle = facing_angle + config.half_angle + t * rear_span;
                points.push(cast_ray(world, origin, angle, rear_radius, config.step));
            }
        }
        None => {
            // No facing: full-circle sweep at full radius.
            for i in 0..config.ray_budget {
                let angle = i as f32 / config.ray_budget as f32 * TAU;
                points.push(cast_ray(world, origin, angle, config.radius, config.step));
            }
        }
    }
    points
}

/// One ray: first blocked point, or the max-radius endpoint.
fn cast_ray(world: &CollisionWorld, origin: Vec3, angle: f32, radius: f32, step: f32) -> Vec2 {
    let dir = Vec2::new(angle.cos(), angle.sin());
    let end = origin + Vec3::new(dir.x * radius, dir.y * radius, 0.0);
    match world.raycast(origin, end, step) {
        Some(hit) => hit.truncate(),
        None => end.truncate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::StaticCollider;

    fn angle_of(origin: Vec2, p: Vec2) -> f32 {
        (p - origin).y.atan2((p - origin).x)
    }

    fn angular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(TAU);
        d.min(TAU - d)
    }

    #[test]
    fn open_field_returns_budget_plus_origin() {
        let world = CollisionWorld::new();
        let config = FovConfig::default();
        let fan = visibility_polygon(
            &world,
            Vec3::ZERO,
            Some(Vec2::new(1.0, 0.0)),
            &config,
        );
        assert_eq!(fan.len(), config.ray_budget + 1);
        assert_eq!(fan[0], Vec2::ZERO);
    }

    #[test]
    fn forward_cone_stays_within_half_angle() {
        let world = CollisionWorld::new();
        let config = FovConfig::default();
        let origin = Vec2::ZERO;
        let fan = visibility_polygon(&world, Vec3::ZERO, Some(Vec2::new(0.0, 1.0)), &config);
        let facing_angle = std::f32::consts::FRAC_PI_2;

        let forward_rays = (config.ray_budget as f32 * 0.8) as usize;
        for p in &fan[1..=forward_rays] {
            let off = angular_distance(angle_of(origin, *p), facing_angle);
            assert!(off <= config.half_angle + 1e-3, "forward ray at offset {off}");
            // Full radius in an open field.
            assert!((p.distance(origin) - config.radius).abs() < 1e-3);
        }
        for p in &fan[forward_rays + 1..] {
            let off = angular_distance(angle_of(origin, *p), facing_angle);
            assert!(off > config.half_angle, "rear ray inside the cone at {off}");
            // Reduced radius behind.
            assert!((p.distance(origin) - config.radius * 0.3).abs() < 1e-3);
        }
    }

    #[test]
    fn arcs_tile_the_circle_without_seam_gaps() {
        let world = CollisionWorld::new();
        let config = FovConfig::default();
        let fan = visibility_polygon(&world, Vec3::ZERO, Some(Vec2::new(1.0, 0.0)), &config);

        let mut angles: Vec<f32> = fan[1..]
            .iter()
            .map(|p| angle_of(Vec2::ZERO, *p).rem_euclid(TAU))
            .collect();
        angles.sort_by(|a, b| a.partial_cmp(b).expect("finite angles"));

        // No double-cast angle.
        for pair in angles.windows(2) {
            assert!(pair[1] - pair[0] > 1e-4, "duplicate ray angle at {}", pair[0]);
        }

        // Largest cyclic gap must not exceed the rear arc's sampling
        // interval: the seams between cone and rear arc are covered.
        let forward_rays = (config.ray_budget as f32 * 0.8) as usize;
        let rear_rays = config.ray_budget - forward_rays;
        let rear_interval = (TAU - config.half_angle * 2.0) / (rear_rays + 1) as f32;
        let mut max_gap: f32 = 0.0;
        for pair in angles.windows(2) {
            max_gap = max_gap.max(pair[1] - pair[0]);
        }
        max_gap = max_gap.max(TAU - angles[angles.len() - 1] + angles[0]);
        assert!(
            max_gap <= rear_interval + 1e-3,
            "seam gap {max_gap} exceeds rear interval {rear_interval}"
        );
    }

    #[test]
    fn no_facing_falls_back_to_full_circle() {
        let world = CollisionWorld::new();
        let config = FovConfig::default();
        let fan = visibility_polygon(&world, Vec3::ZERO, None, &config);
        assert_eq!(fan.len(), config.ray_budget + 1);
        for p in &fan[1..] {
            assert!((p.distance(Vec2::ZERO) - config.radius).abs() < 1e-3);
        }
    }

    #[test]
    fn wall_shortens_rays() {
        let mut world = CollisionWorld::new();
        // Wall of blocks across x = 5.
        for y in -10..=10 {
            world.add_static(StaticCollider::new(Vec3::new(5.0, y as f32, 0.0), 4.0));
        }
        let config = FovConfig::default();
        let fan = visibility_polygon(&world, Vec3::ZERO, Some(Vec2::new(1.0, 0.0)), &config);

        // The straight-ahead ray stops at the wall instead of full radius.
        let ahead = fan[1..]
            .iter()
            .min_by(|a, b| {
                let da = angular_distance(angle_of(Vec2::ZERO, **a), 0.0);
                let db = angular_distance(angle_of(Vec2::ZERO, **b), 0.0);
                da.partial_cmp(&db).expect("finite angles")
            })
            .expect("fan has rays");
        assert!(ahead.x <= 5.01, "ray reached {ahead:?} through the wall");
        assert!(ahead.x > 3.5);
    }
}
