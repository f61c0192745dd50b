//! Viewer data structures: GPU meshes, scene objects and static geometry.
//!
//! - `model` contains the vertex/mesh/model types and the draw trait
//! - `object` pairs a model with its per-frame transform and base color
//! - `grid` generates the reference grid's line geometry
//! - `texture` creates the depth attachment

pub mod grid;
pub mod model;
pub mod object;
pub mod texture;
