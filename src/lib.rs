//! meshview
//!
//! A minimal real-time 3D scene viewer. Model files are imported once at
//! startup, flattened from their node hierarchy into GPU-resident meshes,
//! and drawn every frame with a free-fly camera, a fixed directional light
//! and a translucent reference grid.
//!
//! High-level modules
//! - `camera`: free-fly camera, input controller and view/projection uniform
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: viewer data models (meshes, objects, grid geometry)
//! - `pipelines`: definitions of the render pipelines (basic, wireframe, grid)
//! - `render`: per-frame draw planning and submission
//! - `resources`: importer boundary turning scene files into models
//! - `viewer`: the window event loop and frame protocol
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewer;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
