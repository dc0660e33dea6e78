use crate::arena::ArenaPolicy;
use crate::config::{LabConfig, LabKind, StepMode};
use crate::control::Controller;
use crate::error::SessionError;
use crate::panel::{ControlPanel, Parameter};
use crate::sync::{Entity, LightAttachment, Synchronizer};
use glam::Vec3;
use physlab_common::{Pose, SessionId};
use physlab_input::{InputState, MoveBindings};
use physlab_physics::{BodyDesc, BodyHandle, PhysicsWorld, Shape};
use physlab_render::{Color, Geometry, Light, LightId, Material, MeshId, MeshNode, OrbitCamera, Scene};

const FLOOR_SIZE: f32 = 10.0;
const FLOOR_COLOR: u32 = 0x777777;
const BARRIER_COLOR: u32 = 0x8a8a8a;
const SUN_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);
const SUN_INTENSITY: f32 = 0.6;
const HEADLIGHT_OFFSETS: [Vec3; 2] = [Vec3::new(-0.8, 0.5, 2.0), Vec3::new(0.8, 0.5, 2.0)];

pub const AMBIENT_PARAM: &str = "Amb. Light";
pub const SUN_PARAM: &str = "Dir. Light";
pub const HEADLIGHT_PARAM: &str = "Headlights";

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Internal physics steps run this tick.
    pub substeps: u32,
    /// Bodies the arena policy pulled back inside.
    pub clamped: usize,
}

/// Arena policy together with what it acts on.
#[derive(Debug, Clone)]
pub struct Arena {
    pub policy: ArenaPolicy,
    pub mesh: MeshId,
    pub bodies: Vec<BodyHandle>,
}

/// One fully built lab: physics world, scene, camera, controller and panel.
///
/// Built in one go from a [`LabConfig`] and a limits flag, and never
/// partially changed afterwards: flipping the flag means building a new one.
#[derive(Debug)]
pub struct LabWorld {
    id: SessionId,
    generation: u64,
    config: LabConfig,
    limits_enabled: bool,
    physics: PhysicsWorld,
    scene: Scene,
    camera: OrbitCamera,
    sync: Synchronizer,
    controller: Controller,
    arena: Option<Arena>,
    panel: ControlPanel,
    ambient: LightId,
    ticks: u64,
}

impl LabWorld {
    pub fn build(config: &LabConfig, limits_enabled: bool, generation: u64) -> Result<Self, SessionError> {
        config.validate()?;
        let id = SessionId::new();
        let _span = tracing::info_span!("build", lab = %config.kind, id = %id.short(), generation).entered();

        let mut physics = PhysicsWorld::new(config.gravity, config.material)?;
        physics.add_body(BodyDesc::floor())?;

        let mut scene = Scene::new();
        let mut floor = MeshNode::new(
            "floor",
            Geometry::Plane {
                width: FLOOR_SIZE,
                depth: FLOOR_SIZE,
            },
            Material::solid(Color::hex(FLOOR_COLOR)),
        )
        .receiving_shadow();
        if config.kind == LabKind::VehicleArena {
            floor.material.metalness = 0.3;
            floor.material.roughness = 0.4;
        }
        scene.add_mesh(floor);

        let ambient_intensity = match config.kind {
            LabKind::BarrierCourse => 2.1,
            LabKind::VehicleArena => 1.0,
        };
        let ambient = scene.add_light(Light::Ambient {
            color: Color::WHITE,
            intensity: ambient_intensity,
        });
        let sun = scene.add_light(Light::Directional {
            color: Color::WHITE,
            intensity: SUN_INTENSITY,
            position: SUN_POSITION,
            cast_shadow: true,
        });

        let mut panel = ControlPanel::new();
        panel.add(Parameter::new(AMBIENT_PARAM, ambient_intensity, 0.0, 3.0, 0.1).driving(ambient));
        panel.add(Parameter::new(SUN_PARAM, SUN_INTENSITY, 0.0, 3.0, 0.1).driving(sun));

        let mut sync = Synchronizer::new();
        let (controller, arena, camera) = match config.kind {
            LabKind::BarrierCourse => {
                let player = spawn(
                    &mut physics,
                    &mut scene,
                    &mut sync,
                    "player",
                    BodyDesc::dynamic(
                        Shape::Box {
                            half_extents: Vec3::splat(0.25),
                        },
                        1.0,
                        Vec3::new(0.0, 1.0, 0.0),
                    ),
                    Material::solid(Color::RED),
                )?;
                if limits_enabled {
                    build_barriers(&mut physics, &mut scene, &mut sync)?;
                }
                let controller = Controller::new(player.body, MoveBindings::wasd(), config.control);
                let camera = OrbitCamera::looking_at(Vec3::new(-3.0, 3.0, 3.0), Vec3::ZERO);
                (controller, None, camera)
            }
            LabKind::VehicleArena => {
                let car = spawn(
                    &mut physics,
                    &mut scene,
                    &mut sync,
                    "car",
                    BodyDesc::dynamic(
                        Shape::Box {
                            half_extents: Vec3::new(1.0, 0.5, 2.0),
                        },
                        2.0,
                        Vec3::new(0.0, 1.0, 0.0),
                    ),
                    Material::solid(Color::RED),
                )?;
                let ball = spawn(
                    &mut physics,
                    &mut scene,
                    &mut sync,
                    "ball",
                    BodyDesc::dynamic(Shape::Sphere { radius: 0.5 }, 1.0, Vec3::new(2.0, 1.0, 0.0)),
                    Material::solid(Color::GREEN),
                )?;

                let mut headlights = Parameter::new(HEADLIGHT_PARAM, 2.0, 0.0, 5.0, 0.1);
                for offset in HEADLIGHT_OFFSETS {
                    let light = scene.add_light(Light::Point {
                        color: Color::WHITE,
                        intensity: 2.0,
                        distance: 5.0,
                        position: Vec3::new(0.0, 1.0, 0.0) + offset,
                    });
                    sync.attach_light(LightAttachment {
                        light,
                        mesh: car.mesh,
                        offset,
                    });
                    headlights = headlights.driving(light);
                }
                panel.add(headlights);

                let policy = ArenaPolicy::new(config.arena, limits_enabled);
                let mesh = scene.add_mesh(
                    MeshNode::new(
                        "limits",
                        Geometry::Box {
                            size: config.arena.visual_size(),
                        },
                        Material::wireframe(Color::BLUE, 0.2),
                    )
                    .at(config.arena.visual_center()),
                );
                policy.show(&mut scene, mesh);

                let controller = Controller::new(car.body, MoveBindings::arrows(), config.control);
                let camera = OrbitCamera::looking_at(Vec3::new(-5.0, 5.0, 10.0), Vec3::ZERO);
                let arena = Arena {
                    policy,
                    mesh,
                    bodies: vec![car.body, ball.body],
                };
                (controller, Some(arena), camera)
            }
        };

        sync.sync_all(&physics, &mut scene)?;
        tracing::debug!(
            bodies = physics.body_count(),
            meshes = scene.mesh_count(),
            lights = scene.light_count(),
            limits_enabled,
            "lab built"
        );

        Ok(Self {
            id,
            generation,
            config: config.clone(),
            limits_enabled,
            physics,
            scene,
            camera,
            sync,
            controller,
            arena,
            panel,
            ambient,
            ticks: 0,
        })
    }

    /// One frame: controller, physics step, arena clamp, sync, panel, camera.
    pub fn tick(&mut self, input: &InputState, elapsed: f32) -> Result<TickReport, SessionError> {
        self.controller.apply(input, &mut self.physics)?;

        let dt = self.config.fixed_dt;
        let substeps = match self.config.step_mode {
            StepMode::Fixed => {
                self.physics.step(dt)?;
                1
            }
            StepMode::Accumulated { max_substeps } => self.physics.step_with(dt, elapsed, max_substeps)?,
        };

        let clamped = match &self.arena {
            Some(arena) => arena.policy.apply(&mut self.physics, &arena.bodies)?,
            None => 0,
        };
        if clamped > 0 {
            tracing::trace!(clamped, "bodies pulled back into arena");
        }

        self.sync.sync_all(&self.physics, &mut self.scene)?;
        self.panel.apply(&mut self.scene);
        self.camera.update();

        self.ticks += 1;
        Ok(TickReport {
            tick: self.ticks,
            substeps,
            clamped,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> LabKind {
        self.config.kind
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn limits_enabled(&self) -> bool {
        self.limits_enabled
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut ControlPanel {
        &mut self.panel
    }

    pub fn arena(&self) -> Option<&Arena> {
        self.arena.as_ref()
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn entities(&self) -> &[Entity] {
        self.sync.entities()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.sync.find(name)
    }

    pub fn ambient_light(&self) -> LightId {
        self.ambient
    }

    /// Current pose of a named entity's body.
    pub fn pose_of(&self, name: &str) -> Result<Option<Pose>, SessionError> {
        match self.sync.find(name) {
            Some(e) => Ok(Some(self.physics.pose(e.body)?)),
            None => Ok(None),
        }
    }
}

fn spawn(
    physics: &mut PhysicsWorld,
    scene: &mut Scene,
    sync: &mut Synchronizer,
    name: &'static str,
    desc: BodyDesc,
    material: Material,
) -> Result<Entity, SessionError> {
    let geometry = match desc.shape {
        Shape::Box { half_extents } => Geometry::Box {
            size: half_extents * 2.0,
        },
        Shape::Sphere { radius } => Geometry::Sphere { radius },
        Shape::HalfSpace { .. } => Geometry::Plane {
            width: FLOOR_SIZE,
            depth: FLOOR_SIZE,
        },
    };
    let body = physics.add_body(desc)?;
    let node = MeshNode::new(name, geometry, material)
        .at(desc.pose.position)
        .casting_shadow();
    let entity = Entity {
        name,
        body,
        mesh: scene.add_mesh(node),
    };
    sync.track(entity);
    Ok(entity)
}

/// Four static walls fencing the 10x10 floor.
fn build_barriers(
    physics: &mut PhysicsWorld,
    scene: &mut Scene,
    sync: &mut Synchronizer,
) -> Result<(), SessionError> {
    let along_x = Vec3::new(5.0, 0.5, 0.1);
    let along_z = Vec3::new(0.1, 0.5, 5.0);
    let walls: [(&'static str, Vec3, Vec3); 4] = [
        ("barrier-north", Vec3::new(0.0, 0.5, -5.0), along_x),
        ("barrier-south", Vec3::new(0.0, 0.5, 5.0), along_x),
        ("barrier-east", Vec3::new(5.0, 0.5, 0.0), along_z),
        ("barrier-west", Vec3::new(-5.0, 0.5, 0.0), along_z),
    ];
    for (name, position, half_extents) in walls {
        spawn(
            physics,
            scene,
            sync,
            name,
            BodyDesc::fixed(Shape::Box { half_extents }, position),
            Material::solid(Color::hex(BARRIER_COLOR)),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlMode;
    use physlab_input::Key;

    #[test]
    fn barrier_course_layout() {
        let lab = LabWorld::build(&LabConfig::barrier_course(), true, 0).unwrap();
        // floor + player + four walls
        assert_eq!(lab.physics().body_count(), 6);
        assert_eq!(lab.entities().len(), 5);
        assert!(lab.arena().is_none());
        assert_eq!(lab.pose_of("player").unwrap().unwrap().position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(lab.scene().light(lab.ambient_light()).unwrap().intensity(), 2.1);

        let open = LabWorld::build(&LabConfig::barrier_course(), false, 1).unwrap();
        assert_eq!(open.physics().body_count(), 2);
        assert!(open.entity("barrier-north").is_none());
    }

    #[test]
    fn vehicle_arena_layout() {
        let lab = LabWorld::build(&LabConfig::vehicle_arena(), true, 0).unwrap();
        assert_eq!(lab.physics().body_count(), 3);
        let arena = lab.arena().unwrap();
        assert!(arena.policy.enabled);
        assert_eq!(arena.bodies.len(), 2);
        let limits = lab.scene().mesh(arena.mesh).unwrap();
        assert!(limits.visible);
        assert_eq!(limits.transform.position, Vec3::new(0.0, 3.0, 0.0));

        let off = LabWorld::build(&LabConfig::vehicle_arena(), false, 1).unwrap();
        let arena = off.arena().unwrap();
        assert!(!off.scene().mesh(arena.mesh).unwrap().visible);
    }

    #[test]
    fn headlights_follow_car() {
        let mut lab = LabWorld::build(&LabConfig::vehicle_arena(), true, 0).unwrap();
        let mut input = InputState::new();
        input.press(Key::ArrowLeft);
        for _ in 0..10 {
            lab.tick(&input, 1.0 / 60.0).unwrap();
        }
        let car = lab.pose_of("car").unwrap().unwrap().position;
        let lights: Vec<Vec3> = lab
            .scene()
            .lights()
            .values()
            .filter(|l| matches!(l, Light::Point { .. }))
            .filter_map(Light::position)
            .collect();
        assert_eq!(lights, vec![car + HEADLIGHT_OFFSETS[0], car + HEADLIGHT_OFFSETS[1]]);
    }

    #[test]
    fn nudged_car_is_clamped() {
        let mut lab = LabWorld::build(&LabConfig::vehicle_arena(), true, 0).unwrap();
        let mut input = InputState::new();
        input.press(Key::ArrowRight);
        let mut clamped = 0;
        for _ in 0..120 {
            clamped += lab.tick(&input, 1.0 / 60.0).unwrap().clamped;
        }
        assert!(clamped > 0);
        assert!(lab.pose_of("car").unwrap().unwrap().position.x <= 5.0);
    }

    #[test]
    fn nudged_car_escapes_without_limits() {
        let mut config = LabConfig::vehicle_arena();
        config.gravity = Vec3::ZERO;
        let mut lab = LabWorld::build(&config, false, 0).unwrap();
        let mut input = InputState::new();
        input.press(Key::ArrowUp);
        for _ in 0..100 {
            lab.tick(&input, 1.0 / 60.0).unwrap();
        }
        assert!(lab.pose_of("car").unwrap().unwrap().position.z < -5.0);
    }

    #[test]
    fn meshes_match_bodies_after_tick() {
        let mut lab = LabWorld::build(&LabConfig::barrier_course(), true, 0).unwrap();
        let mut input = InputState::new();
        input.press(Key::KeyW);
        for _ in 0..30 {
            lab.tick(&input, 1.0 / 60.0).unwrap();
        }
        for entity in lab.entities() {
            let mesh = lab.scene().mesh(entity.mesh).unwrap();
            assert_eq!(mesh.transform.pose(), lab.physics().pose(entity.body).unwrap());
        }
        assert_eq!(lab.ticks(), 30);
    }

    #[test]
    fn fixed_mode_steps_once_per_tick() {
        let mut lab = LabWorld::build(&LabConfig::barrier_course(), true, 0).unwrap();
        let report = lab.tick(&InputState::new(), 0.5).unwrap();
        assert_eq!(report.substeps, 1);

        let mut lab = LabWorld::build(&LabConfig::vehicle_arena(), true, 0).unwrap();
        let report = lab.tick(&InputState::new(), 0.5).unwrap();
        assert_eq!(report.substeps, 3);
    }

    #[test]
    fn panel_drives_ambient() {
        let mut lab = LabWorld::build(&LabConfig::barrier_course(), true, 0).unwrap();
        lab.panel_mut().set(AMBIENT_PARAM, 0.7);
        lab.tick(&InputState::new(), 1.0 / 60.0).unwrap();
        let intensity = lab.scene().light(lab.ambient_light()).unwrap().intensity();
        assert!((intensity - 0.7).abs() < 1e-5);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = LabConfig::barrier_course();
        config.control = ControlMode::Force {
            magnitude: 100.0,
            damping: 2.0,
        };
        assert!(matches!(
            LabWorld::build(&config, true, 0),
            Err(SessionError::Config(_))
        ));
    }
}
