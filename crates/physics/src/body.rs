use glam::{Quat, Vec3};
use physlab_common::Pose;
use serde::{Deserialize, Serialize};

/// Stable handle to a body inside one [`PhysicsWorld`](crate::PhysicsWorld).
///
/// Handles are dense indices in insertion order, so two worlds built by the
/// same sequence of `add_body` calls hand out identical handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Surface response used for every contact a collider takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

/// Collision shape of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Infinite plane through the body origin, solid on the side opposite
    /// to `normal`.
    HalfSpace { normal: Vec3 },
}

/// Dynamic bodies integrate forces; fixed bodies never move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    Dynamic { mass: f32 },
    Fixed,
}

/// Everything needed to insert one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: Shape,
    pub pose: Pose,
    /// Overrides the world's default material when set.
    pub material: Option<ContactMaterial>,
}

impl BodyDesc {
    pub fn dynamic(shape: Shape, mass: f32, position: Vec3) -> Self {
        Self {
            kind: BodyKind::Dynamic { mass },
            shape,
            pose: Pose::from_position(position),
            material: None,
        }
    }

    pub fn fixed(shape: Shape, position: Vec3) -> Self {
        Self {
            kind: BodyKind::Fixed,
            shape,
            pose: Pose::from_position(position),
            material: None,
        }
    }

    /// The y=0 ground plane facing up.
    pub fn floor() -> Self {
        Self::fixed(Shape::HalfSpace { normal: Vec3::Y }, Vec3::ZERO)
    }

    pub fn with_material(mut self, material: ContactMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.pose.rotation = rotation;
        self
    }
}
