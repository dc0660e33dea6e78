//! wgpu render backend for the physics labs.
//!
//! Scenes are packed on the CPU into instance batches by [`FramePacker`] and
//! drawn by [`WgpuRenderer`]: lit boxes, spheres and floor planes, then
//! translucent wireframe boxes.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - Camera motion is not part of the simulation.
//! - Physics tick rate is separate from render frame rate.

mod frame;
mod geometry;
mod gpu;
mod shaders;

pub use frame::{Batch, FrameData, FramePacker, InstanceData, MAX_POINT_LIGHTS, MeshKind, Uniforms};
pub use gpu::WgpuRenderer;
