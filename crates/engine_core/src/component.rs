//! Component payloads attached to scene nodes.
//!
//! Components are a closed set of tagged variants. The data lives here so
//! every engine crate can reason about it; the per-tick behavior that drives
//! each variant lives in the game crate's systems.

use glam::{IVec2, Vec2, Vec3};
use std::collections::VecDeque;

use crate::scene::NodeId;

/// Stable tag for component lookup on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Ai,
    Appearance,
    Projectiles,
}

/// AI state for villagers and other autonomous entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AiState {
    #[default]
    Idle,
    Wander,
    Investigate,
    Flee,
    Work,
}

/// Finite-state-machine data for one autonomous entity.
///
/// The state machine itself runs in the game crate; this struct only holds
/// what survives between ticks. Entering a state always clears the current
/// path so the next tick requests a fresh one.
#[derive(Debug, Clone, Default)]
pub struct AiBehavior {
    pub state: AiState,
    /// Remaining grid waypoints, lead waypoint at the front.
    pub path: VecDeque<IVec2>,
    /// Cooldown before leaving the current state (seconds).
    pub state_timer: f32,
    /// Walk speed in grid units per second.
    pub move_speed: f32,
    /// How far wander destinations may stray from the current position.
    pub wander_radius: f32,
    /// Noise origin being fled from, while in [`AiState::Flee`].
    pub flee_from: Option<Vec2>,
    /// Point being walked toward, while in [`AiState::Investigate`].
    pub investigate_target: Option<Vec2>,
    /// Whether the entity moved last tick (renderers pick walk/idle poses off this).
    pub moving: bool,
    pub(crate) owner: Option<NodeId>,
}

impl AiBehavior {
    pub fn new(move_speed: f32, wander_radius: f32) -> Self {
        Self {
            move_speed,
            wander_radius,
            ..Default::default()
        }
    }

    /// The node this component is attached to, once `ready` has run.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Switch state, dropping any in-progress path.
    pub fn enter(&mut self, state: AiState, cooldown: f32) {
        self.state = state;
        self.state_timer = cooldown;
        self.path.clear();
        if state != AiState::Flee {
            self.flee_from = None;
        }
        if state != AiState::Investigate {
            self.investigate_target = None;
        }
    }
}

/// Cosmetic customization carried by a node.
///
/// Pure data: renderers read it for tinting, the network layer serializes it
/// into presence payloads. No per-tick logic.
#[derive(Debug, Clone)]
pub struct Appearance {
    pub base_color: [u8; 3],
    pub accent_color: [u8; 3],
    pub accessories: Vec<u16>,
    pub(crate) owner: Option<NodeId>,
}

impl Appearance {
    pub fn new(base_color: [u8; 3], accent_color: [u8; 3]) -> Self {
        Self {
            base_color,
            accent_color,
            accessories: Vec::new(),
            owner: None,
        }
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }
}

/// One live projectile.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Remaining lifetime in seconds; expired shots are culled.
    pub ttl: f32,
}

/// Manager for the projectiles fired by one node.
#[derive(Debug, Clone, Default)]
pub struct ProjectileSet {
    pub shots: Vec<Projectile>,
    pub(crate) owner: Option<NodeId>,
}

impl ProjectileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    /// Fire a projectile with the given lifetime.
    pub fn fire(&mut self, position: Vec3, velocity: Vec3, ttl: f32) {
        self.shots.push(Projectile {
            position,
            velocity,
            ttl,
        });
    }
}

/// A behavior unit attached to exactly one scene node.
#[derive(Debug, Clone)]
pub enum Component {
    Ai(AiBehavior),
    Appearance(Appearance),
    Projectiles(ProjectileSet),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Ai(_) => ComponentKind::Ai,
            Component::Appearance(_) => ComponentKind::Appearance,
            Component::Projectiles(_) => ComponentKind::Projectiles,
        }
    }

    /// One-time attach hook: records the owning node.
    pub(crate) fn ready(&mut self, owner: NodeId) {
        match self {
            Component::Ai(c) => c.owner = Some(owner),
            Component::Appearance(c) => c.owner = Some(owner),
            Component::Projectiles(c) => c.owner = Some(owner),
        }
    }

    pub fn as_ai(&self) -> Option<&AiBehavior> {
        match self {
            Component::Ai(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_ai_mut(&mut self) -> Option<&mut AiBehavior> {
        match self {
            Component::Ai(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_appearance(&self) -> Option<&Appearance> {
        match self {
            Component::Appearance(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_projectiles_mut(&mut self) -> Option<&mut ProjectileSet> {
        match self {
            Component::Projectiles(c) => Some(c),
            _ => None,
        }
    }
}
