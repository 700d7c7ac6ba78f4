//! Spatial queries for gridhaven: grid-hash collision world, segment
//! raycasting, and field-of-view fans.

pub mod fov;
pub mod raycast;
pub mod world;

pub use fov::*;
pub use raycast::*;
pub use world::*;
