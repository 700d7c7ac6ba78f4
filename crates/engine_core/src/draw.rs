//! Draw submission seam.
//!
//! The engine never draws; the scene's draw traversal hands ordered
//! submissions to whatever renderer the host wires in.

use glam::Vec3;

use crate::scene::NodeId;

/// One submission from the draw traversal.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: NodeId,
    /// Global position (local position summed over ancestors).
    pub position: Vec3,
    pub draw_order: i32,
}

/// Renderer-side sink for draw submissions.
pub trait DrawQueue {
    fn submit(&mut self, item: DrawItem);
}
