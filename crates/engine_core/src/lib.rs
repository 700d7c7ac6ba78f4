//! Core engine types for gridhaven.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Scene graph (nodes, components, traversal)
//! - Frame clock and day/night cycle
//! - Draw submission seam for renderers

pub mod component;
pub mod draw;
pub mod scene;
pub mod time;

pub use component::*;
pub use draw::*;
pub use scene::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{IVec2, Vec2, Vec3};
