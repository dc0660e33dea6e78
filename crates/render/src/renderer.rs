use crate::camera::OrbitCamera;
use crate::scene::{Geometry, Light, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and camera, then produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> Self::Output;
}

/// Headless renderer producing a human-readable frame description.
///
/// Used by the CLI and in tests to check what a frame would show.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also list hidden meshes, marked as such.
    pub show_hidden: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> String {
        let mut out = String::new();
        let eye = camera.eye();
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "=== Scene (meshes={}, lights={}) ===",
            scene.mesh_count(),
            scene.light_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            eye.x,
            eye.y,
            eye.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees
        );

        for (id, node) in scene.meshes() {
            if !node.visible && !self.show_hidden {
                continue;
            }
            let p = node.transform.position;
            let kind = match node.geometry {
                Geometry::Box { .. } if node.material.wireframe => "wirebox",
                Geometry::Box { .. } => "box",
                Geometry::Sphere { .. } => "sphere",
                Geometry::Plane { .. } => "plane",
            };
            let _ = writeln!(
                out,
                "  mesh#{} {} [{}] pos=({:.2}, {:.2}, {:.2}){}",
                id.0,
                node.name,
                kind,
                p.x,
                p.y,
                p.z,
                if node.visible { "" } else { " (hidden)" }
            );
        }

        for (id, light) in scene.lights() {
            let _ = match light {
                Light::Ambient { intensity, .. } => {
                    writeln!(out, "  light#{} ambient intensity={intensity:.2}", id.0)
                }
                Light::Directional {
                    intensity,
                    position,
                    ..
                } => writeln!(
                    out,
                    "  light#{} directional intensity={intensity:.2} pos=({:.2}, {:.2}, {:.2})",
                    id.0, position.x, position.y, position.z
                ),
                Light::Point {
                    intensity,
                    position,
                    ..
                } => writeln!(
                    out,
                    "  light#{} point intensity={intensity:.2} pos=({:.2}, {:.2}, {:.2})",
                    id.0, position.x, position.y, position.z
                ),
            };
        }

        out
    }
}
