//! Rendering Adapter: renderer-agnostic scene graph and renderer interface.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Mesh transforms are written by the owner of the scene (the session),
//!   never derived inside a renderer.
//!
//! The [`DebugTextRenderer`] is the headless backend used by the CLI and in
//! tests; the GPU backend lives in `physlab-render-wgpu`.

mod camera;
mod renderer;
mod scene;

pub use camera::OrbitCamera;
pub use renderer::{DebugTextRenderer, Renderer};
pub use scene::{Color, Geometry, Light, LightId, Material, MeshId, MeshNode, Scene};
