//! Villager AI: a finite state machine over noise senses, pathfinding, and
//! waypoint movement.
//!
//! Tick order per entity: sense the noise bus, run the current state's
//! logic, then execute movement along whatever path is left. Every state
//! transition drops the path, so the next tick always plans fresh.

use engine_core::{AiBehavior, AiState, NodeId, Scene};
use glam::{Vec2, Vec3};
use rand::Rng;

use crate::services::{Services, NOISE_COMBAT};
use crate::state::GameState;

/// Waypoints closer than this are considered reached.
pub const ARRIVAL_TOLERANCE: f32 = 0.1;
/// Idle cooldown after a wander destination turned out unreachable.
pub const WANDER_FAIL_COOLDOWN: f32 = 2.0;
/// Idle cooldown after an investigation target turned out unreachable.
pub const INVESTIGATE_FAIL_COOLDOWN: f32 = 3.0;
/// Idle cooldown after a flee route turned out unreachable.
pub const FLEE_FAIL_COOLDOWN: f32 = 2.0;
/// Fleeing entities move this much faster than their walk speed.
pub const FLEE_SPEED_MULT: f32 = 1.5;
/// How far away from the noise origin a flee route aims.
pub const FLEE_DISTANCE: f32 = 6.0;
/// Seconds a villager stays clocked in at a work station.
pub const WORK_SHIFT: f32 = 20.0;

fn idle_cooldown(rng: &mut impl Rng) -> f32 {
    1.0 + rng.gen::<f32>() * 3.0
}

/// One AI tick for one entity.
pub fn update_ai(
    scene: &mut Scene,
    id: NodeId,
    ai: &mut AiBehavior,
    dt: f32,
    services: &mut Services,
    state: &mut GameState,
) {
    let pos = scene.global_position(id);
    let pos2 = pos.truncate();
    let mut rng = rand::thread_rng();

    // 1) Sense: react to the first audible noise event. Combat sends any
    // state fleeing; anything else draws attention unless already fleeing.
    if let Some(event) = services.noise.first_audible(pos2) {
        let origin = event.origin;
        if event.tag == NOISE_COMBAT {
            if ai.state != AiState::Flee {
                ai.enter(AiState::Flee, 0.0);
                ai.flee_from = Some(origin);
            }
        } else if ai.state != AiState::Flee && ai.state != AiState::Investigate {
            ai.enter(AiState::Investigate, 0.0);
            ai.investigate_target = Some(origin);
        }
    }

    // 2) State logic.
    match ai.state {
        AiState::Idle => {
            ai.state_timer -= dt;
            if ai.state_timer <= 0.0 {
                if services.clock.is_night() {
                    // Villagers keep to themselves after dark.
                    ai.state_timer = idle_cooldown(&mut rng);
                } else if state.in_work_zone(pos2) {
                    ai.enter(AiState::Work, WORK_SHIFT);
                } else {
                    ai.enter(AiState::Wander, 0.0);
                }
            }
        }
        AiState::Wander => {
            if ai.path.is_empty() {
                let offset = Vec2::new(rng.gen::<f32>() * 2.0 - 1.0, rng.gen::<f32>() * 2.0 - 1.0)
                    * ai.wander_radius;
                request_path(services, ai, pos, pos2 + offset);
                if ai.path.is_empty() {
                    ai.enter(AiState::Idle, WANDER_FAIL_COOLDOWN);
                }
            }
        }
        AiState::Investigate => {
            if ai.path.is_empty() {
                match ai.investigate_target {
                    Some(target) => {
                        request_path(services, ai, pos, target);
                        if ai.path.is_empty() {
                            ai.enter(AiState::Idle, INVESTIGATE_FAIL_COOLDOWN);
                        }
                    }
                    None => ai.enter(AiState::Idle, idle_cooldown(&mut rng)),
                }
            }
        }
        AiState::Flee => {
            if ai.path.is_empty() {
                match ai.flee_from {
                    Some(origin) => {
                        // Directly away from the noise.
                        let away = (pos2 - origin).try_normalize().unwrap_or_else(|| {
                            let a = rng.gen::<f32>() * std::f32::consts::TAU;
                            Vec2::new(a.cos(), a.sin())
                        });
                        request_path(services, ai, pos, pos2 + away * FLEE_DISTANCE);
                        if ai.path.is_empty() {
                            ai.enter(AiState::Idle, FLEE_FAIL_COOLDOWN);
                        }
                    }
                    None => ai.enter(AiState::Idle, idle_cooldown(&mut rng)),
                }
            }
        }
        AiState::Work => {
            ai.state_timer -= dt;
            if ai.state_timer <= 0.0 {
                ai.enter(AiState::Idle, idle_cooldown(&mut rng));
            }
        }
    }

    // 3) Movement: walk toward the lead waypoint, pop it on arrival.
    let speed_mult = if ai.state == AiState::Flee {
        FLEE_SPEED_MULT
    } else {
        1.0
    };
    if let Some(&next) = ai.path.front() {
        let target = Vec2::new(next.x as f32, next.y as f32);
        let to_target = target - pos2;
        let dist = to_target.length();
        if dist <= ARRIVAL_TOLERANCE {
            ai.path.pop_front();
            if ai.path.is_empty() {
                ai.moving = false;
                complete_path(ai, &mut rng);
            }
        } else {
            let step = (ai.move_speed * speed_mult * dt).min(dist);
            let delta = to_target / dist * step;
            if let Some(node) = scene.get_mut(id) {
                node.position.x += delta.x;
                node.position.y += delta.y;
            }
            ai.moving = true;
        }
    } else {
        ai.moving = false;
    }
}

/// The path finished: travel states settle back into Idle.
fn complete_path(ai: &mut AiBehavior, rng: &mut impl Rng) {
    match ai.state {
        AiState::Wander | AiState::Investigate | AiState::Flee => {
            ai.enter(AiState::Idle, idle_cooldown(rng));
        }
        AiState::Idle | AiState::Work => {}
    }
}

fn request_path(services: &Services, ai: &mut AiBehavior, from: Vec3, to: Vec2) {
    let goal = Vec3::new(to.x, to.y, from.z);
    ai.path = services
        .nav
        .get_path(services.collision, from, goal)
        .into_iter()
        .collect();
}
