use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use physlab_render::{Geometry, Light, OrbitCamera, Renderer, Scene};
use std::ops::Range;

pub const MAX_POINT_LIGHTS: usize = 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Summed ambient colour times intensity.
    pub ambient: [f32; 4],
    /// Unit direction towards the directional light.
    pub sun_dir: [f32; 4],
    pub sun_color: [f32; 4],
    /// xyz position, w cutoff distance.
    pub point_pos: [[f32; 4]; MAX_POINT_LIGHTS],
    pub point_color: [[f32; 4]; MAX_POINT_LIGHTS],
    /// x holds the number of point lights in use.
    pub counts: [u32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Which shared mesh a batch draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MeshKind {
    Plane,
    Cube,
    Sphere,
    WireCube,
}

impl MeshKind {
    pub const ALL: [MeshKind; 4] = [MeshKind::Plane, MeshKind::Cube, MeshKind::Sphere, MeshKind::WireCube];
}

#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub kind: MeshKind,
    pub instances: Range<u32>,
}

/// Everything the GPU needs for one frame, packed on the CPU.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub uniforms: Uniforms,
    pub instances: Vec<InstanceData>,
    /// Contiguous instance ranges in draw order: solids, then wireframes.
    pub batches: Vec<Batch>,
}

impl FrameData {
    pub fn batch(&self, kind: MeshKind) -> Option<&Batch> {
        self.batches.iter().find(|b| b.kind == kind)
    }
}

/// Packs a [`Scene`] into [`FrameData`]. Hidden meshes are skipped.
#[derive(Debug, Default)]
pub struct FramePacker;

impl Renderer for FramePacker {
    type Output = FrameData;

    fn render(&self, scene: &Scene, camera: &OrbitCamera) -> FrameData {
        let mut by_kind: Vec<(MeshKind, InstanceData)> = scene
            .visible_meshes()
            .map(|(_, node)| {
                let (kind, local_scale) = match node.geometry {
                    Geometry::Box { size } if node.material.wireframe => (MeshKind::WireCube, size),
                    Geometry::Box { size } => (MeshKind::Cube, size),
                    Geometry::Sphere { radius } => (MeshKind::Sphere, Vec3::splat(radius)),
                    Geometry::Plane { width, depth } => (MeshKind::Plane, Vec3::new(width, 1.0, depth)),
                };
                let t = node.transform;
                let model = Mat4::from_scale_rotation_translation(t.scale * local_scale, t.rotation, t.position);
                let instance = InstanceData {
                    model: model.to_cols_array_2d(),
                    color: node.material.color.to_array(node.material.opacity),
                };
                (kind, instance)
            })
            .collect();
        // Stable: keeps scene order inside each batch.
        by_kind.sort_by_key(|(kind, _)| *kind);

        let mut batches: Vec<Batch> = Vec::new();
        for (i, (kind, _)) in by_kind.iter().enumerate() {
            let i = i as u32;
            match batches.last_mut() {
                Some(batch) if batch.kind == *kind => batch.instances.end = i + 1,
                _ => batches.push(Batch {
                    kind: *kind,
                    instances: i..i + 1,
                }),
            }
        }

        FrameData {
            uniforms: pack_lights(scene, camera.view_projection()),
            instances: by_kind.into_iter().map(|(_, inst)| inst).collect(),
            batches,
        }
    }
}

fn pack_lights(scene: &Scene, view_proj: Mat4) -> Uniforms {
    let mut u = Uniforms {
        view_proj: view_proj.to_cols_array_2d(),
        ..Uniforms::zeroed()
    };
    let mut points = 0usize;
    for light in scene.lights().values() {
        match *light {
            Light::Ambient { color, intensity } => {
                let c = color.to_array(0.0);
                for i in 0..3 {
                    u.ambient[i] += c[i] * intensity;
                }
            }
            Light::Directional {
                color,
                intensity,
                position,
                ..
            } => {
                // Aimed at the origin, like an unparented directional light.
                let dir = position.normalize_or(Vec3::Y);
                u.sun_dir = [dir.x, dir.y, dir.z, 0.0];
                let c = color.to_array(0.0);
                u.sun_color = [c[0] * intensity, c[1] * intensity, c[2] * intensity, 1.0];
            }
            Light::Point {
                color,
                intensity,
                distance,
                position,
            } => {
                if points == MAX_POINT_LIGHTS {
                    tracing::warn!("more than {MAX_POINT_LIGHTS} point lights, extra ones ignored");
                    continue;
                }
                u.point_pos[points] = [position.x, position.y, position.z, distance];
                let c = color.to_array(0.0);
                u.point_color[points] = [c[0] * intensity, c[1] * intensity, c[2] * intensity, 1.0];
                points += 1;
            }
        }
    }
    u.counts[0] = points as u32;
    u
}
