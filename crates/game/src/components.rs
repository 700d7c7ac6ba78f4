//! Component dispatch: one place that fans the scene's update traversal out
//! to the system owning each component kind.

use engine_core::{Component, Scene};

use crate::ai;
use crate::projectile;
use crate::services::Services;
use crate::state::GameState;

/// Run one simulation step over the whole scene.
pub fn update_components(
    scene: &mut Scene,
    dt: f32,
    services: &mut Services,
    state: &mut GameState,
) {
    let root = scene.root();
    scene.update_subtree(root, &mut |scene, id, component| match component {
        Component::Ai(behavior) => ai::update_ai(scene, id, behavior, dt, services, state),
        Component::Projectiles(set) => {
            projectile::update_projectiles(scene, id, set, dt, services)
        }
        // Appearance is pure data; nothing to advance.
        Component::Appearance(_) => {}
    });
}
