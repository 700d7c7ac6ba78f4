//! The per-frame service context handed to every component update, and the
//! noise bus that routes world events into AI senses.

use engine_core::{DrawQueue, WorldClock};
use glam::Vec2;
use nav::Pathfinder;
use spatial::CollisionWorld;

/// Reserved noise tag: anything carrying it sends nearby AI fleeing.
pub const NOISE_COMBAT: &str = "combat";
/// How long a published noise event stays audible.
pub const NOISE_TTL: f32 = 1.5;

/// One audible event in the world.
#[derive(Debug, Clone)]
pub struct NoiseEvent {
    pub origin: Vec2,
    /// Entities within this radius of the origin can hear it.
    pub radius: f32,
    pub tag: String,
    pub age: f32,
}

/// Shared registry of recent noise events. Published by projectiles,
/// interactions, and the demo driver; scanned by AI senses each tick.
#[derive(Debug, Default)]
pub struct NoiseBus {
    events: Vec<NoiseEvent>,
}

impl NoiseBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, origin: Vec2, radius: f32, tag: impl Into<String>) {
        self.events.push(NoiseEvent {
            origin,
            radius,
            tag: tag.into(),
            age: 0.0,
        });
    }

    /// Age events and drop the expired ones. Once per frame.
    pub fn update(&mut self, dt: f32) {
        for event in &mut self.events {
            event.age += dt;
        }
        self.events.retain(|e| e.age < NOISE_TTL);
    }

    pub fn events(&self) -> &[NoiseEvent] {
        &self.events
    }

    /// First event audible from `pos`: each event's own radius decides.
    pub fn first_audible(&self, pos: Vec2) -> Option<&NoiseEvent> {
        self.events
            .iter()
            .find(|e| e.origin.distance_squared(pos) <= e.radius * e.radius)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Typed collaborator registry passed into every update call.
///
/// One struct instead of a name→object map: every consumer names the field
/// it needs and the compiler checks it.
pub struct Services<'a> {
    pub collision: &'a CollisionWorld,
    pub nav: &'a Pathfinder,
    pub clock: &'a WorldClock,
    pub noise: &'a mut NoiseBus,
    /// Present only when something is rendering.
    pub renderer: Option<&'a mut dyn DrawQueue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_expire_after_ttl() {
        let mut bus = NoiseBus::new();
        bus.publish(Vec2::ZERO, 5.0, "bell");
        assert_eq!(bus.events().len(), 1);
        bus.update(NOISE_TTL + 0.1);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn audibility_uses_the_event_radius() {
        let mut bus = NoiseBus::new();
        bus.publish(Vec2::ZERO, 2.0, "bell");
        bus.publish(Vec2::new(10.0, 0.0), 20.0, NOISE_COMBAT);

        // Too far for the bell, inside the combat radius.
        let heard = bus.first_audible(Vec2::new(5.0, 0.0)).unwrap();
        assert_eq!(heard.tag, NOISE_COMBAT);

        // Close to the bell: it comes first in publish order.
        let heard = bus.first_audible(Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(heard.tag, "bell");
    }
}
