use glam::Vec3;
use physlab_physics::{BodyHandle, PhysicsError, PhysicsWorld};
use physlab_render::{MeshId, Scene};
use serde::{Deserialize, Serialize};

/// Axis-aligned play volume: `[-x, x]` by `(-inf, y]` by `[-z, z]`, floor at y=0.
///
/// No lower y bound: the floor body holds things up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub half_extents: Vec3,
}

impl ArenaBounds {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            half_extents: Vec3::new(x, y, z),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.half_extents.is_finite() && self.half_extents.min_element() > 0.0
    }

    /// Project a position into the bounds.
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        let e = self.half_extents;
        Vec3::new(p.x.clamp(-e.x, e.x), p.y.min(e.y), p.z.clamp(-e.z, e.z))
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.clamp(p) == p
    }

    /// Size of the box drawn to show the bounds.
    pub fn visual_size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    /// Centre of the drawn box: resting on the floor.
    pub fn visual_center(&self) -> Vec3 {
        Vec3::new(0.0, self.half_extents.y, 0.0)
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::new(5.0, 3.0, 5.0)
    }
}

/// Bounds plus the on/off switch that decides whether they apply.
///
/// When disabled, [`ArenaPolicy::clamp`] is the identity and the bounds
/// visualization is hidden; bodies are held only by the physics world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaPolicy {
    pub bounds: ArenaBounds,
    pub enabled: bool,
}

impl ArenaPolicy {
    pub fn new(bounds: ArenaBounds, enabled: bool) -> Self {
        Self { bounds, enabled }
    }

    pub fn clamp(&self, p: Vec3) -> Vec3 {
        if self.enabled {
            self.bounds.clamp(p)
        } else {
            p
        }
    }

    /// Clamp every tracked body in place. Returns how many were moved.
    ///
    /// Only bodies that were actually outside are written back, so bodies
    /// inside the arena are not woken or disturbed.
    pub fn apply(
        &self,
        world: &mut PhysicsWorld,
        bodies: &[BodyHandle],
    ) -> Result<usize, PhysicsError> {
        if !self.enabled {
            return Ok(0);
        }
        let mut moved = 0;
        for &body in bodies {
            let p = world.position(body)?;
            let clamped = self.bounds.clamp(p);
            if clamped != p {
                world.set_position(body, clamped)?;
                moved += 1;
            }
        }
        Ok(moved)
    }

    /// Match the visualization mesh to the switch.
    pub fn show(&self, scene: &mut Scene, mesh: MeshId) -> bool {
        scene.set_visible(mesh, self.enabled)
    }
}
