use crate::error::SessionError;
use glam::Vec3;
use physlab_common::Pose;
use physlab_physics::{BodyHandle, PhysicsWorld};
use physlab_render::{LightId, MeshId, Scene};

/// A physics body paired with the mesh that shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entity {
    pub name: &'static str,
    pub body: BodyHandle,
    pub mesh: MeshId,
}

/// A positioned light that follows a mesh at a fixed world-space offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightAttachment {
    pub light: LightId,
    pub mesh: MeshId,
    pub offset: Vec3,
}

/// Copy one body pose onto its mesh, verbatim.
///
/// No smoothing or interpolation: after this call the mesh position and
/// rotation are bit-for-bit the body's.
pub fn sync(world: &PhysicsWorld, scene: &mut Scene, entity: &Entity) -> Result<Pose, SessionError> {
    let pose = world.pose(entity.body)?;
    let node = scene
        .mesh_mut(entity.mesh)
        .ok_or(SessionError::MissingMesh(entity.mesh))?;
    node.transform.set_pose(pose);
    Ok(pose)
}

/// Runs once per tick, after the physics step and arena clamp.
#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    entities: Vec<Entity>,
    attachments: Vec<LightAttachment>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn attach_light(&mut self, attachment: LightAttachment) {
        self.attachments.push(attachment);
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn attachments(&self) -> &[LightAttachment] {
        &self.attachments
    }

    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Sync every tracked entity, then move attached lights.
    ///
    /// Lights read the mesh position just written, so they are never a frame
    /// behind the mesh they follow.
    pub fn sync_all(&self, world: &PhysicsWorld, scene: &mut Scene) -> Result<(), SessionError> {
        for entity in &self.entities {
            sync(world, scene, entity)?;
        }
        for attachment in &self.attachments {
            let anchor = scene
                .mesh(attachment.mesh)
                .ok_or(SessionError::MissingMesh(attachment.mesh))?
                .transform
                .position;
            scene.set_light_position(attachment.light, anchor + attachment.offset);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use physlab_physics::{BodyDesc, ContactMaterial, Shape};
    use physlab_render::{Color, Geometry, Light, Material, MeshNode};

    fn setup() -> (PhysicsWorld, Scene, Entity) {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactMaterial::default())
            .unwrap();
        let body = world
            .add_body(
                BodyDesc::dynamic(
                    Shape::Box {
                        half_extents: Vec3::new(1.0, 0.5, 2.0),
                    },
                    2.0,
                    Vec3::new(0.3, 4.0, -1.7),
                )
                .with_rotation(Quat::from_rotation_y(0.4)),
            )
            .unwrap();
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(MeshNode::new(
            "car",
            Geometry::Box {
                size: Vec3::new(2.0, 1.0, 4.0),
            },
            Material::solid(Color::RED),
        ));
        (world, scene, Entity { name: "car", body, mesh })
    }

    #[test]
    fn sync_copies_pose_exactly() {
        let (mut world, mut scene, entity) = setup();
        world.set_velocity(entity.body, Vec3::new(1.0, 0.0, 2.0)).unwrap();
        for _ in 0..7 {
            world.step(1.0 / 60.0).unwrap();
        }
        let pose = sync(&world, &mut scene, &entity).unwrap();
        let t = scene.mesh(entity.mesh).unwrap().transform;
        assert_eq!(t.position, world.position(entity.body).unwrap());
        assert_eq!(t.rotation, world.rotation(entity.body).unwrap());
        assert_eq!(t.pose(), pose);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn mesh_lags_body_until_synced() {
        let (mut world, mut scene, entity) = setup();
        sync(&world, &mut scene, &entity).unwrap();
        world.step(1.0 / 60.0).unwrap();
        let mesh_y = scene.mesh(entity.mesh).unwrap().transform.position.y;
        assert!(mesh_y > world.position(entity.body).unwrap().y);
    }

    #[test]
    fn missing_mesh_is_reported() {
        let (world, mut scene, mut entity) = setup();
        entity.mesh = MeshId(42);
        assert!(matches!(
            sync(&world, &mut scene, &entity),
            Err(SessionError::MissingMesh(MeshId(42)))
        ));
    }

    #[test]
    fn lights_follow_synced_mesh() {
        let (world, mut scene, entity) = setup();
        let light = scene.add_light(Light::Point {
            color: Color::WHITE,
            intensity: 2.0,
            distance: 5.0,
            position: Vec3::ZERO,
        });
        let mut sync = Synchronizer::new();
        sync.track(entity);
        sync.attach_light(LightAttachment {
            light,
            mesh: entity.mesh,
            offset: Vec3::new(-0.8, 0.5, 2.0),
        });
        sync.sync_all(&world, &mut scene).unwrap();

        let body = world.position(entity.body).unwrap();
        let lit = scene.light(light).and_then(Light::position).unwrap();
        assert_eq!(lit, body + Vec3::new(-0.8, 0.5, 2.0));
        assert_eq!(sync.find("car"), Some(&entity));
    }
}
