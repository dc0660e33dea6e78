use glam::Vec3;
use physlab_common::Transform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Handle of a mesh node in a [`Scene`]. Dense, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// Handle of a light in a [`Scene`]. Dense, in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(pub u32);

/// Linear RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 0.5, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a `0xRRGGBB` literal.
    pub fn hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    pub fn to_array(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

/// Mesh geometry in local space, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box { size: Vec3 },
    Sphere { radius: f32 },
    /// Flat rectangle in the XZ plane facing +Y.
    Plane { width: f32, depth: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub wireframe: bool,
    pub metalness: f32,
    pub roughness: f32,
}

impl Material {
    pub fn solid(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            wireframe: false,
            metalness: 0.0,
            roughness: 1.0,
        }
    }

    pub fn wireframe(color: Color, opacity: f32) -> Self {
        Self {
            opacity,
            wireframe: true,
            ..Self::solid(color)
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// A drawable node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::default(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn casting_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    Directional {
        color: Color,
        intensity: f32,
        position: Vec3,
        cast_shadow: bool,
    },
    /// Falls off to zero at `distance`; zero distance means no cutoff.
    Point {
        color: Color,
        intensity: f32,
        distance: f32,
        position: Vec3,
    },
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient { intensity, .. }
            | Light::Directional { intensity, .. }
            | Light::Point { intensity, .. } => *intensity,
        }
    }

    pub fn set_intensity(&mut self, value: f32) {
        match self {
            Light::Ambient { intensity, .. }
            | Light::Directional { intensity, .. }
            | Light::Point { intensity, .. } => *intensity = value,
        }
    }

    /// Ambient lights have no position.
    pub fn position(&self) -> Option<Vec3> {
        match self {
            Light::Ambient { .. } => None,
            Light::Directional { position, .. } | Light::Point { position, .. } => Some(*position),
        }
    }
}

/// The render-side scene graph: meshes and lights.
///
/// Uses BTreeMap so renderers see nodes in creation order on every platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    meshes: BTreeMap<MeshId, MeshNode>,
    lights: BTreeMap<LightId, Light>,
    next_mesh: u32,
    next_light: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, node: MeshNode) -> MeshId {
        let id = MeshId(self.next_mesh);
        self.next_mesh += 1;
        self.meshes.insert(id, node);
        id
    }

    pub fn add_light(&mut self, light: Light) -> LightId {
        let id = LightId(self.next_light);
        self.next_light += 1;
        self.lights.insert(id, light);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshNode> {
        self.meshes.get(&id)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut MeshNode> {
        self.meshes.get_mut(&id)
    }

    pub fn light(&self, id: LightId) -> Option<&Light> {
        self.lights.get(&id)
    }

    pub fn light_mut(&mut self, id: LightId) -> Option<&mut Light> {
        self.lights.get_mut(&id)
    }

    /// Returns false when the mesh does not exist.
    pub fn set_visible(&mut self, id: MeshId, visible: bool) -> bool {
        match self.meshes.get_mut(&id) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Move a positioned light. Returns false for ambient or missing lights.
    pub fn set_light_position(&mut self, id: LightId, to: Vec3) -> bool {
        match self.lights.get_mut(&id) {
            Some(Light::Directional { position, .. } | Light::Point { position, .. }) => {
                *position = to;
                true
            }
            _ => false,
        }
    }

    pub fn meshes(&self) -> &BTreeMap<MeshId, MeshNode> {
        &self.meshes
    }

    pub fn lights(&self) -> &BTreeMap<LightId, Light> {
        &self.lights
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn visible_meshes(&self) -> impl Iterator<Item = (&MeshId, &MeshNode)> {
        self.meshes.iter().filter(|(_, node)| node.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        let grey = Color::hex(0x777777);
        assert!((grey.r - 119.0 / 255.0).abs() < 1e-6);
        assert_eq!(grey.r, grey.g);
        assert_eq!(Color::hex(0xffffff), Color::WHITE);
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut scene = Scene::new();
        let a = scene.add_mesh(MeshNode::new(
            "a",
            Geometry::Sphere { radius: 1.0 },
            Material::solid(Color::RED),
        ));
        let b = scene.add_mesh(MeshNode::new(
            "b",
            Geometry::Sphere { radius: 1.0 },
            Material::solid(Color::RED),
        ));
        assert!(a < b);
        let names: Vec<&str> = scene.meshes().values().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn visibility_filter() {
        let mut scene = Scene::new();
        let id = scene.add_mesh(MeshNode::new(
            "box",
            Geometry::Box { size: Vec3::ONE },
            Material::wireframe(Color::BLUE, 0.2),
        ));
        assert_eq!(scene.visible_meshes().count(), 1);
        assert!(scene.set_visible(id, false));
        assert_eq!(scene.visible_meshes().count(), 0);
        assert!(!scene.set_visible(MeshId(99), true));
    }

    #[test]
    fn ambient_light_has_no_position() {
        let mut scene = Scene::new();
        let ambient = scene.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: 1.0,
        });
        let point = scene.add_light(Light::Point {
            color: Color::WHITE,
            intensity: 2.0,
            distance: 5.0,
            position: Vec3::ZERO,
        });
        assert!(!scene.set_light_position(ambient, Vec3::ONE));
        assert!(scene.set_light_position(point, Vec3::ONE));
        assert_eq!(scene.light(point).and_then(Light::position), Some(Vec3::ONE));
    }

    #[test]
    fn light_intensity_round_trip() {
        let mut light = Light::Directional {
            color: Color::WHITE,
            intensity: 0.6,
            position: Vec3::splat(5.0),
            cast_shadow: true,
        };
        light.set_intensity(1.5);
        assert_eq!(light.intensity(), 1.5);
    }
}
