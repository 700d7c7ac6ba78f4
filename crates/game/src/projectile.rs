//! Projectile updates: integrate, expire, and turn impacts into combat
//! noise so nearby AI reacts.

use engine_core::{NodeId, ProjectileSet, Scene};

use crate::services::{Services, NOISE_COMBAT};

/// Narrow probe for projectile collision.
pub const PROJECTILE_PROBE: f32 = 0.1;
/// Radius of the combat noise an impact publishes.
pub const IMPACT_NOISE_RADIUS: f32 = 8.0;

/// Draw-order key for tracer submissions; above world geometry.
const TRACER_DRAW_ORDER: i32 = 100;

/// Advance every shot owned by one node.
pub fn update_projectiles(
    _scene: &mut Scene,
    id: NodeId,
    set: &mut ProjectileSet,
    dt: f32,
    services: &mut Services,
) {
    let collision = services.collision;
    let noise = &mut *services.noise;
    set.shots.retain_mut(|shot| {
        shot.position += shot.velocity * dt;
        shot.ttl -= dt;
        if shot.ttl <= 0.0 {
            return false;
        }
        if collision.check_collision(shot.position, PROJECTILE_PROBE) {
            noise.publish(shot.position.truncate(), IMPACT_NOISE_RADIUS, NOISE_COMBAT);
            return false;
        }
        true
    });

    // Live shots render as tracers.
    if let Some(renderer) = services.renderer.as_deref_mut() {
        for shot in &set.shots {
            renderer.submit(engine_core::DrawItem {
                node: id,
                position: shot.position,
                draw_order: TRACER_DRAW_ORDER,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::update_components;
    use crate::services::NoiseBus;
    use crate::state::GameState;
    use engine_core::{Component, ComponentKind, Node, WorldClock, Vec3};
    use nav::Pathfinder;
    use spatial::{CollisionWorld, StaticCollider};

    fn tick(
        scene: &mut Scene,
        world: &CollisionWorld,
        noise: &mut NoiseBus,
        state: &mut GameState,
        dt: f32,
    ) {
        let nav = Pathfinder::new();
        let clock = WorldClock::new();
        let mut services = Services {
            collision: world,
            nav: &nav,
            clock: &clock,
            noise,
            renderer: None,
        };
        update_components(scene, dt, &mut services, state);
    }

    #[test]
    fn impact_publishes_combat_noise() {
        let mut scene = Scene::new();
        let mut world = CollisionWorld::new();
        world.add_static(StaticCollider::new(Vec3::new(5.0, 0.0, 0.0), 4.0));

        let shooter = scene.spawn_child(scene.root(), Node::new("turret"));
        let mut set = ProjectileSet::new();
        set.fire(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 5.0);
        scene.add_component(shooter, Component::Projectiles(set));

        let mut noise = NoiseBus::new();
        let mut state = GameState::new();
        for _ in 0..20 {
            tick(&mut scene, &world, &mut noise, &mut state, 0.05);
            if !noise.events().is_empty() {
                break;
            }
        }

        let event = noise.events().first().expect("impact made noise");
        assert_eq!(event.tag, NOISE_COMBAT);
        assert!((event.origin.x - 4.5).abs() < 1.0, "impact at {}", event.origin);

        let set = scene
            .get_component(shooter, ComponentKind::Projectiles)
            .and_then(|c| match c {
                Component::Projectiles(s) => Some(s),
                _ => None,
            })
            .unwrap();
        assert!(set.shots.is_empty(), "shot removed on impact");
    }

    #[test]
    fn impact_noise_sends_bystanders_fleeing() {
        use engine_core::{AiBehavior, AiState};

        let mut scene = Scene::new();
        let mut world = CollisionWorld::new();
        world.add_static(StaticCollider::new(Vec3::new(5.0, 0.0, 0.0), 4.0));

        let shooter = scene.spawn_child(scene.root(), Node::new("turret"));
        let mut set = ProjectileSet::new();
        set.fire(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 5.0);
        scene.add_component(shooter, Component::Projectiles(set));

        let bystander =
            scene.spawn_child(scene.root(), Node::new("villager").with_position(Vec3::new(8.0, 2.0, 0.0)));
        scene.add_component(bystander, Component::Ai(AiBehavior::new(2.0, 5.0)));

        let mut noise = NoiseBus::new();
        let mut state = GameState::new();
        let mut fled = false;
        for _ in 0..30 {
            tick(&mut scene, &world, &mut noise, &mut state, 0.05);
            let ai = scene
                .get_component(bystander, ComponentKind::Ai)
                .and_then(|c| c.as_ai())
                .unwrap();
            if ai.state == AiState::Flee {
                fled = true;
                break;
            }
        }
        assert!(fled, "bystander never reacted to the impact");
    }

    #[test]
    fn shots_expire_on_ttl() {
        let mut scene = Scene::new();
        let world = CollisionWorld::new();
        let shooter = scene.spawn_child(scene.root(), Node::new("turret"));
        let mut set = ProjectileSet::new();
        set.fire(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 0.2);
        scene.add_component(shooter, Component::Projectiles(set));

        let mut noise = NoiseBus::new();
        let mut state = GameState::new();
        for _ in 0..10 {
            tick(&mut scene, &world, &mut noise, &mut state, 0.05);
        }

        let set = scene
            .get_component(shooter, ComponentKind::Projectiles)
            .and_then(|c| match c {
                Component::Projectiles(s) => Some(s),
                _ => None,
            })
            .unwrap();
        assert!(set.shots.is_empty());
        assert!(noise.events().is_empty(), "no impact, no noise");
    }
}
