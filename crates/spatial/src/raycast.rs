//! Segment raycasting over the collision world.

use engine_core::Vec3;

use crate::world::CollisionWorld;

/// Default march step in world units.
pub const DEFAULT_RAY_STEP: f32 = 0.1;
/// Narrow probe half-extent used while marching.
pub const RAY_PROBE_SIZE: f32 = 0.1;

impl CollisionWorld {
    /// March a point from `start` to `end` in fixed-size steps, testing a
    /// narrow probe at each sample. Returns the first blocked point, or
    /// `None` if the segment is clear.
    ///
    /// The step count is computed up front from the segment length, so float
    /// accumulation can never turn the march into an unbounded loop, and the
    /// same start/end/step always yields the same first hit. A degenerate
    /// segment (`start == end`) returns `None` without stepping.
    pub fn raycast(&self, start: Vec3, end: Vec3, step: f32) -> Option<Vec3> {
        let delta = end - start;
        let length = delta.length();
        if length <= f32::EPSILON {
            return None;
        }
        let step = step.max(1e-3);
        let dir = delta / length;
        let steps = (length / step).ceil() as u32;
        for i in 0..=steps {
            let t = (i as f32 * step).min(length);
            let point = start + dir * t;
            if self.check_collision(point, RAY_PROBE_SIZE) {
                return Some(point);
            }
        }
        None
    }

    /// True when nothing blocks the segment between two points.
    pub fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        self.raycast(from, to, DEFAULT_RAY_STEP).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::StaticCollider;

    #[test]
    fn clear_segment_returns_none() {
        let world = CollisionWorld::new();
        assert!(world
            .raycast(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), DEFAULT_RAY_STEP)
            .is_none());
    }

    #[test]
    fn first_hit_is_before_the_block_center() {
        let mut world = CollisionWorld::new();
        world.add_static(StaticCollider::new(Vec3::new(5.0, 0.0, 0.0), 2.0));

        let hit = world
            .raycast(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), DEFAULT_RAY_STEP)
            .expect("ray must hit the block");
        // Footprint edge is at 5.0 - (0.4 + 0.1) = 4.5.
        assert!(hit.x > 4.4 && hit.x < 4.8, "hit at {hit:?}");
        assert_eq!(hit.y, 0.0);
    }

    #[test]
    fn raycast_is_deterministic() {
        let mut world = CollisionWorld::new();
        world.add_static(StaticCollider::new(Vec3::new(3.0, 3.0, 0.0), 2.0));
        let a = world.raycast(Vec3::ZERO, Vec3::new(6.0, 6.0, 0.0), DEFAULT_RAY_STEP);
        let b = world.raycast(Vec3::ZERO, Vec3::new(6.0, 6.0, 0.0), DEFAULT_RAY_STEP);
        assert_eq!(a, b);
    }

    #[test]
    fn degenerate_segment_skips_marching() {
        let mut world = CollisionWorld::new();
        world.add_static(StaticCollider::new(Vec3::ZERO, 2.0));
        let p = Vec3::new(0.1, 0.1, 0.0);
        assert!(world.raycast(p, p, DEFAULT_RAY_STEP).is_none());
    }

    #[test]
    fn line_of_sight_over_a_low_block() {
        let mut world = CollisionWorld::new();
        // Block occupying z in [0, 1).
        world.add_static(StaticCollider::new(Vec3::new(5.0, 0.0, 0.0), 2.0));

        assert!(!world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)));
        // Ray cast above the block's band is clear.
        assert!(world.line_of_sight(Vec3::new(0.0, 0.0, 1.5), Vec3::new(10.0, 0.0, 1.5)));
    }
}
