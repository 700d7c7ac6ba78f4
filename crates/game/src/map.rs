//! Map document loading and collision-world population.
//!
//! The map is a JSON document produced by the external editor: a grid size
//! plus an ordered list of block records. Blocks with a vertical size
//! register as static colliders; blocks tagged with the `work` interaction
//! also contribute a work zone villagers can clock into.

use glam::{Vec2, Vec3};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use spatial::{CollisionWorld, StaticCollider};

/// Half-extent of the square work zone around a work-tagged block.
pub const WORK_ZONE_HALF: f32 = 1.5;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("could not read map: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed map: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One placed block.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockRecord {
    pub name: String,
    /// Grid x/y plus height z of the block's base.
    pub position: [f32; 3],
    /// Vertical size scalar; zero means a flat decal with no collider.
    pub size: f32,
    pub color: [u8; 4],
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub interaction: String,
    pub tile: u32,
}

/// The whole persisted map.
#[derive(Debug, Clone, Deserialize)]
pub struct MapDoc {
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<BlockRecord>,
}

impl MapDoc {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Axis-aligned region villagers treat as a work station.
#[derive(Debug, Clone, Copy)]
pub struct WorkZone {
    pub min: Vec2,
    pub max: Vec2,
}

impl WorkZone {
    pub fn around(center: Vec2, half: f32) -> Self {
        Self {
            min: center - Vec2::splat(half),
            max: center + Vec2::splat(half),
        }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }
}

/// What populating a map produced.
#[derive(Debug, Default)]
pub struct MapSummary {
    pub colliders: usize,
    pub work_zones: Vec<WorkZone>,
}

/// Register the map's blocks with the collision world.
pub fn populate(doc: &MapDoc, world: &mut CollisionWorld) -> MapSummary {
    let mut summary = MapSummary::default();
    for block in &doc.blocks {
        let position = Vec3::from_array(block.position);
        log::trace!(
            "block {} tile {} zone {:?} color {:?} at {position}",
            block.name,
            block.tile,
            block.zone,
            block.color
        );
        if block.size > 0.0 {
            world.add_static(StaticCollider::new(position, block.size));
            summary.colliders += 1;
        }
        if block.interaction == "work" {
            summary
                .work_zones
                .push(WorkZone::around(position.truncate(), WORK_ZONE_HALF));
        }
    }
    log::info!(
        "map {}x{}: {} colliders, {} work zones",
        doc.width,
        doc.height,
        summary.colliders,
        summary.work_zones.len()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav::Pathfinder;

    const DOC: &str = r#"{
        "width": 16,
        "height": 16,
        "blocks": [
            {"name": "wall", "position": [3.0, 0.0, 0.0], "size": 4.0,
             "color": [120, 120, 130, 255], "zone": "plaza", "tile": 2},
            {"name": "bench", "position": [6.0, 2.0, 0.0], "size": 1.0,
             "color": [160, 110, 60, 255], "interaction": "work", "tile": 5},
            {"name": "rug", "position": [1.0, 1.0, 0.0], "size": 0.0,
             "color": [200, 40, 40, 255], "tile": 9}
        ]
    }"#;

    #[test]
    fn parses_defaults_for_missing_tags() {
        let doc: MapDoc = serde_json::from_str(DOC).unwrap();
        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.blocks[0].interaction, "");
        assert_eq!(doc.blocks[1].zone, "");
    }

    #[test]
    fn populate_registers_solids_only() {
        let doc: MapDoc = serde_json::from_str(DOC).unwrap();
        let mut world = CollisionWorld::new();
        let summary = populate(&doc, &mut world);

        // The rug has no vertical size and no collider.
        assert_eq!(summary.colliders, 2);
        assert_eq!(summary.work_zones.len(), 1);
        assert!(summary.work_zones[0].contains(Vec2::new(6.0, 2.0)));
        assert!(world.check_collision(Vec3::new(3.0, 0.0, 0.0), 0.4));
        assert!(!world.check_collision(Vec3::new(1.0, 1.0, 0.0), 0.4));
    }

    #[test]
    fn populated_blocks_divert_paths() {
        let doc: MapDoc = serde_json::from_str(DOC).unwrap();
        let mut world = CollisionWorld::new();
        populate(&doc, &mut world);

        let nav = Pathfinder::new();
        let path = nav.get_path(&world, Vec3::new(0.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
        assert!(!path.is_empty());
        assert!(!path.contains(&glam::IVec2::new(3, 0)), "path crossed the wall");
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = serde_json::from_str::<MapDoc>(r#"{"width": 4}"#).unwrap_err();
        let err = MapError::from(err);
        assert!(matches!(err, MapError::Parse(_)));
    }
}
