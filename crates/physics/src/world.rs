use crate::body::{BodyDesc, BodyHandle, BodyKind, ContactMaterial, Shape};
use glam::{Quat, Vec3};
use physlab_common::Pose;
use rapier3d::na::{Isometry3, Quaternion, Translation3, Unit, UnitQuaternion};
use rapier3d::prelude::*;
use std::fmt;

/// Errors from physics world construction and use.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("gravity must be finite, got {0}")]
    InvalidGravity(Vec3),
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("elapsed time must be non-negative and finite, got {0}")]
    InvalidElapsed(f32),
    #[error("dynamic body mass must be positive and finite, got {0}")]
    InvalidMass(f32),
    #[error("invalid shape: {0}")]
    InvalidShape(&'static str),
    #[error("unknown body {0:?}")]
    UnknownBody(BodyHandle),
}

/// The simulated world.
///
/// Owns every rapier set and pipeline. Callers only ever see
/// [`BodyHandle`]s and `glam` types.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    default_material: ContactMaterial,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    handles: Vec<RigidBodyHandle>,
    /// Real time not yet consumed by fixed steps.
    accumulator: f32,
    steps: u64,
    time: f64,
}

impl PhysicsWorld {
    /// Create an empty world with the given gravity and default contact material.
    pub fn new(gravity: Vec3, default_material: ContactMaterial) -> Result<Self, PhysicsError> {
        if !gravity.is_finite() {
            return Err(PhysicsError::InvalidGravity(gravity));
        }
        Ok(Self {
            gravity: to_vector(gravity),
            default_material,
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            handles: Vec::new(),
            accumulator: 0.0,
            steps: 0,
            time: 0.0,
        })
    }

    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    pub fn body_count(&self) -> usize {
        self.handles.len()
    }

    /// Internal steps taken since creation.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Simulated seconds since creation.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Insert a body with its single collider.
    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        let material = desc.material.unwrap_or(self.default_material);
        let collider = match desc.shape {
            Shape::Box { half_extents } => {
                if !(half_extents.is_finite() && half_extents.min_element() > 0.0) {
                    return Err(PhysicsError::InvalidShape("box half-extents must be positive"));
                }
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Shape::Sphere { radius } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(PhysicsError::InvalidShape("sphere radius must be positive"));
                }
                ColliderBuilder::ball(radius)
            }
            Shape::HalfSpace { normal } => {
                if !(normal.is_finite() && normal.length_squared() > 0.0) {
                    return Err(PhysicsError::InvalidShape("half-space normal must be non-zero"));
                }
                ColliderBuilder::halfspace(Unit::new_normalize(to_vector(normal)))
            }
        }
        .friction(material.friction)
        .restitution(material.restitution);

        let isometry = Isometry3::from_parts(
            Translation3::new(desc.pose.position.x, desc.pose.position.y, desc.pose.position.z),
            to_rotation(desc.pose.rotation),
        );
        let (body, collider) = match desc.kind {
            BodyKind::Dynamic { mass } => {
                if !(mass.is_finite() && mass > 0.0) {
                    return Err(PhysicsError::InvalidMass(mass));
                }
                (
                    RigidBodyBuilder::dynamic().position(isometry).build(),
                    collider.mass(mass).build(),
                )
            }
            BodyKind::Fixed => (
                RigidBodyBuilder::fixed().position(isometry).build(),
                collider.build(),
            ),
        };

        let rb = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, rb, &mut self.bodies);
        let handle = BodyHandle(self.handles.len());
        self.handles.push(rb);
        tracing::debug!(?handle, kind = ?desc.kind, "body added");
        Ok(handle)
    }

    pub fn position(&self, handle: BodyHandle) -> Result<Vec3, PhysicsError> {
        Ok(from_vector(self.body(handle)?.translation()))
    }

    /// Teleport a body. Velocity is left untouched.
    pub fn set_position(&mut self, handle: BodyHandle, position: Vec3) -> Result<(), PhysicsError> {
        self.body_mut(handle)?
            .set_translation(to_vector(position), true);
        Ok(())
    }

    pub fn rotation(&self, handle: BodyHandle) -> Result<Quat, PhysicsError> {
        Ok(from_rotation(self.body(handle)?.rotation()))
    }

    pub fn pose(&self, handle: BodyHandle) -> Result<Pose, PhysicsError> {
        let body = self.body(handle)?;
        Ok(Pose {
            position: from_vector(body.translation()),
            rotation: from_rotation(body.rotation()),
        })
    }

    pub fn velocity(&self, handle: BodyHandle) -> Result<Vec3, PhysicsError> {
        Ok(from_vector(self.body(handle)?.linvel()))
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> Result<(), PhysicsError> {
        self.body_mut(handle)?
            .set_linvel(to_vector(velocity), true);
        Ok(())
    }

    /// Apply a force through the centre of mass for the next internal step.
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec3) -> Result<(), PhysicsError> {
        self.body_mut(handle)?.add_force(to_vector(force), true);
        Ok(())
    }

    pub fn mass(&self, handle: BodyHandle) -> Result<f32, PhysicsError> {
        Ok(self.body(handle)?.mass())
    }

    /// Advance exactly one internal step of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Result<(), PhysicsError> {
        validate_dt(dt)?;
        self.internal_step(dt);
        Ok(())
    }

    /// Advance by real elapsed time using fixed steps of `fixed_dt`.
    ///
    /// Elapsed time accumulates across calls. At most `max_substeps` steps
    /// run per call; whatever backlog remains is dropped down to less than one
    /// step so a slow frame cannot snowball. Returns the number of steps run.
    pub fn step_with(
        &mut self,
        fixed_dt: f32,
        elapsed: f32,
        max_substeps: u32,
    ) -> Result<u32, PhysicsError> {
        validate_dt(fixed_dt)?;
        if !(elapsed.is_finite() && elapsed >= 0.0) {
            return Err(PhysicsError::InvalidElapsed(elapsed));
        }
        self.accumulator += elapsed;
        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < max_substeps {
            self.internal_step(fixed_dt);
            self.accumulator -= fixed_dt;
            substeps += 1;
        }
        self.accumulator %= fixed_dt;
        Ok(substeps)
    }

    /// Real time waiting to be consumed by `step_with`.
    pub fn pending_time(&self) -> f32 {
        self.accumulator
    }

    fn internal_step(&mut self, dt: f32) {
        self.params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
        for rb in &self.handles {
            if let Some(body) = self.bodies.get_mut(*rb) {
                body.reset_forces(false);
            }
        }
        self.steps += 1;
        self.time += f64::from(dt);
    }

    fn body(&self, handle: BodyHandle) -> Result<&RigidBody, PhysicsError> {
        self.handles
            .get(handle.0)
            .and_then(|rb| self.bodies.get(*rb))
            .ok_or(PhysicsError::UnknownBody(handle))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, PhysicsError> {
        let rb = *self
            .handles
            .get(handle.0)
            .ok_or(PhysicsError::UnknownBody(handle))?;
        self.bodies
            .get_mut(rb)
            .ok_or(PhysicsError::UnknownBody(handle))
    }
}

impl fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("gravity", &self.gravity())
            .field("bodies", &self.handles.len())
            .field("steps", &self.steps)
            .field("accumulator", &self.accumulator)
            .finish()
    }
}

fn validate_dt(dt: f32) -> Result<(), PhysicsError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidTimeStep(dt))
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(q: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(Vec3::new(0.0, -9.82, 0.0), ContactMaterial::default()).unwrap()
    }

    fn cube(position: Vec3) -> BodyDesc {
        BodyDesc::dynamic(
            Shape::Box {
                half_extents: Vec3::splat(0.25),
            },
            1.0,
            position,
        )
    }

    #[test]
    fn rejects_non_finite_gravity() {
        let err = PhysicsWorld::new(Vec3::new(0.0, f32::NAN, 0.0), ContactMaterial::default());
        assert!(matches!(err, Err(PhysicsError::InvalidGravity(_))));
    }

    #[test]
    fn rejects_bad_bodies() {
        let mut w = world();
        let bad_mass = BodyDesc::dynamic(Shape::Sphere { radius: 1.0 }, 0.0, Vec3::ZERO);
        assert_eq!(w.add_body(bad_mass), Err(PhysicsError::InvalidMass(0.0)));
        let bad_box = BodyDesc::fixed(
            Shape::Box {
                half_extents: Vec3::new(1.0, 0.0, 1.0),
            },
            Vec3::ZERO,
        );
        assert!(matches!(w.add_body(bad_box), Err(PhysicsError::InvalidShape(_))));
        assert_eq!(w.body_count(), 0);
    }

    #[test]
    fn handles_are_dense_in_insertion_order() {
        let mut w = world();
        let a = w.add_body(BodyDesc::floor()).unwrap();
        let b = w.add_body(cube(Vec3::Y)).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(w.body_count(), 2);
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let w = world();
        let missing = BodyHandle(3);
        assert_eq!(w.position(missing), Err(PhysicsError::UnknownBody(missing)));
    }

    #[test]
    fn body_falls_under_gravity() {
        let mut w = world();
        let h = w.add_body(cube(Vec3::new(0.0, 10.0, 0.0))).unwrap();
        for _ in 0..10 {
            w.step(DT).unwrap();
        }
        assert!(w.position(h).unwrap().y < 10.0);
        assert!(w.velocity(h).unwrap().y < 0.0);
        assert_eq!(w.steps(), 10);
    }

    #[test]
    fn fixed_body_never_moves() {
        let mut w = world();
        let wall = w
            .add_body(BodyDesc::fixed(
                Shape::Box {
                    half_extents: Vec3::new(5.0, 0.5, 0.1),
                },
                Vec3::new(0.0, 0.5, 5.0),
            ))
            .unwrap();
        for _ in 0..30 {
            w.step(DT).unwrap();
        }
        assert_eq!(w.position(wall).unwrap(), Vec3::new(0.0, 0.5, 5.0));
    }

    #[test]
    fn sphere_comes_to_rest_on_floor() {
        let mut w = world();
        w.add_body(BodyDesc::floor()).unwrap();
        let ball = w
            .add_body(BodyDesc::dynamic(
                Shape::Sphere { radius: 0.5 },
                1.0,
                Vec3::new(2.0, 1.0, 0.0),
            ))
            .unwrap();
        for _ in 0..180 {
            w.step(DT).unwrap();
        }
        let y = w.position(ball).unwrap().y;
        assert!((y - 0.5).abs() < 0.05, "sphere resting at y={y}");
    }

    #[test]
    fn force_is_one_shot() {
        let mut w = PhysicsWorld::new(Vec3::ZERO, ContactMaterial::default()).unwrap();
        let h = w.add_body(cube(Vec3::ZERO)).unwrap();
        w.apply_force(h, Vec3::new(60.0, 0.0, 0.0)).unwrap();
        w.step(DT).unwrap();
        let after_push = w.velocity(h).unwrap().x;
        assert!(after_push > 0.0);
        w.step(DT).unwrap();
        let after_coast = w.velocity(h).unwrap().x;
        assert!((after_coast - after_push).abs() < 1e-5);
    }

    #[test]
    fn dynamic_mass_is_respected() {
        let mut w = world();
        let h = w
            .add_body(BodyDesc::dynamic(
                Shape::Box {
                    half_extents: Vec3::new(1.0, 0.5, 2.0),
                },
                2.0,
                Vec3::Y,
            ))
            .unwrap();
        w.step(DT).unwrap();
        assert!((w.mass(h).unwrap() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn set_position_teleports() {
        let mut w = world();
        let h = w.add_body(cube(Vec3::Y)).unwrap();
        w.set_position(h, Vec3::new(3.0, 1.0, -2.0)).unwrap();
        assert_eq!(w.position(h).unwrap(), Vec3::new(3.0, 1.0, -2.0));
    }

    #[test]
    fn rotation_round_trips() {
        let mut w = world();
        let rot = Quat::from_rotation_y(0.7);
        let h = w.add_body(cube(Vec3::Y).with_rotation(rot)).unwrap();
        let got = w.rotation(h).unwrap();
        assert!(got.abs_diff_eq(rot, 1e-6));
    }

    #[test]
    fn step_with_caps_substeps_and_keeps_remainder() {
        let mut w = world();
        w.add_body(cube(Vec3::Y)).unwrap();

        // First frame of a fresh clock: nothing to do yet.
        assert_eq!(w.step_with(DT, 0.0, 3).unwrap(), 0);

        // 2.5 steps worth of time runs two steps and keeps half a step.
        assert_eq!(w.step_with(DT, DT * 2.5, 3).unwrap(), 2);
        assert!((w.pending_time() - DT * 0.5).abs() < 1e-5);

        // A long stall runs at most three steps and drops the backlog.
        assert_eq!(w.step_with(DT, 1.0, 3).unwrap(), 3);
        assert!(w.pending_time() < DT);
        assert_eq!(w.steps(), 5);
    }

    #[test]
    fn step_rejects_bad_time() {
        let mut w = world();
        assert_eq!(w.step(0.0), Err(PhysicsError::InvalidTimeStep(0.0)));
        assert_eq!(
            w.step_with(DT, -1.0, 3),
            Err(PhysicsError::InvalidElapsed(-1.0))
        );
    }
}
