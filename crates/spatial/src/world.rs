//! Static collision world: a uniform grid hash over entity footprints.
//!
//! Entities are 2D axis-aligned footprints on the grid plane plus a vertical
//! band, bucketed by the cell containing their center. The grid never tracks
//! movement on its own; whoever moves a collider calls [`CollisionWorld::move_static`].

use engine_core::{Vec2, Vec3};
use std::collections::HashMap;

/// Default grid cell edge in world units.
pub const DEFAULT_CELL_SIZE: f32 = 2.0;
/// Default entity half-extent for footprint overlap.
pub const DEFAULT_HALF_EXTENT: f32 = 0.4;
/// Probes occupy an eye-height column starting at their z.
pub const PROBE_HEIGHT: f32 = 1.8;
/// World height per unit of an entity's vertical size scalar.
pub const HEIGHT_SCALE: f32 = 0.5;

/// Handle to a registered collider. Stale handles are tolerated everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderId {
    index: u32,
    generation: u32,
}

/// One registered static entity.
#[derive(Debug, Clone, Copy)]
pub struct StaticCollider {
    /// Grid x/y plus height z of the entity's base.
    pub position: Vec3,
    /// Half-extent of the square footprint.
    pub half_extent: f32,
    /// Vertical size scalar; world height is `size_z * HEIGHT_SCALE`.
    pub size_z: f32,
}

impl StaticCollider {
    pub fn new(position: Vec3, size_z: f32) -> Self {
        Self {
            position,
            half_extent: DEFAULT_HALF_EXTENT,
            size_z,
        }
    }

    pub fn with_half_extent(mut self, half_extent: f32) -> Self {
        self.half_extent = half_extent;
        self
    }

    /// Vertical band `[base, top)` this entity occupies.
    fn band(&self) -> (f32, f32) {
        let base = self.position.z;
        (base, base + self.size_z * HEIGHT_SCALE)
    }
}

struct Slot {
    generation: u32,
    collider: Option<StaticCollider>,
}

/// Uniform grid hash of static entities.
pub struct CollisionWorld {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<ColliderId>>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::with_cell_size(DEFAULT_CELL_SIZE)
    }

    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing a world position: floor division by the cell size.
    pub fn grid_coords(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Register a static entity; O(1) bucket insert.
    pub fn add_static(&mut self, collider: StaticCollider) -> ColliderId {
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.collider = Some(collider);
            ColliderId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                collider: Some(collider),
            });
            ColliderId {
                index,
                generation: 0,
            }
        };
        let key = self.grid_coords(collider.position.truncate());
        self.cells.entry(key).or_default().push(id);
        id
    }

    /// Unregister an entity. Removing one that is not tracked is a no-op.
    pub fn remove_static(&mut self, id: ColliderId) {
        let Some(collider) = self.get(id).copied() else {
            return;
        };
        let key = self.grid_coords(collider.position.truncate());
        if let Some(bucket) = self.cells.get_mut(&key) {
            bucket.retain(|&c| c != id);
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
        let slot = &mut self.slots[id.index as usize];
        slot.collider = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Explicit re-registration for a moved entity: remove + insert under the
    /// new cell. Returns the new handle (the old one goes stale).
    pub fn move_static(&mut self, id: ColliderId, position: Vec3) -> Option<ColliderId> {
        let collider = self.get(id).copied()?;
        self.remove_static(id);
        Some(self.add_static(StaticCollider {
            position,
            ..collider
        }))
    }

    pub fn get(&self, id: ColliderId) -> Option<&StaticCollider> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.collider.as_ref()
    }

    /// Candidate entities in the 3×3 cell block around `pos`'s cell.
    ///
    /// Coarse by design: callers wanting an exact radius do their own check
    /// on the candidates.
    pub fn get_nearby(&self, pos: Vec2) -> Vec<ColliderId> {
        let (cx, cy) = self.grid_coords(pos);
        let mut out = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
        out
    }

    /// AABB + height-band test of a probe column against nearby entities.
    ///
    /// The probe is a square of half-extent `size` occupying the vertical
    /// band `[pos.z, pos.z + PROBE_HEIGHT]`; a candidate collides only when
    /// both footprints and both bands overlap. Ground-level and flying
    /// probes therefore see different obstacles.
    pub fn check_collision(&self, pos: Vec3, size: f32) -> bool {
        let probe_base = pos.z;
        let probe_top = pos.z + PROBE_HEIGHT;
        for id in self.get_nearby(pos.truncate()) {
            let Some(c) = self.get(id) else { continue };
            if (pos.x - c.position.x).abs() >= size + c.half_extent {
                continue;
            }
            if (pos.y - c.position.y).abs() >= size + c.half_extent {
                continue;
            }
            let (base, top) = c.band();
            if probe_base < top && probe_top > base {
                return true;
            }
        }
        false
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.collider.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
