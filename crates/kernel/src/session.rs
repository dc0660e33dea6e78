use crate::audio::SoundEffect;
use crate::config::{LabConfig, LabKind};
use crate::error::SessionError;
use crate::lab::{LabWorld, TickReport};
use physlab_input::{Action, InputState, Key};

/// The barriers/limits flag as a state. Lab A reads it as "barriers built",
/// Lab B as "arena clamp active".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    LimitsEnabled,
    LimitsDisabled,
}

impl SessionState {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            SessionState::LimitsEnabled
        } else {
            SessionState::LimitsDisabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == SessionState::LimitsEnabled
    }

    pub fn toggled(self) -> Self {
        Self::from_flag(!self.is_enabled())
    }

    /// Label for the toggle button: names what pressing it will do.
    pub fn button_label(self, kind: LabKind) -> &'static str {
        match (kind, self) {
            (LabKind::BarrierCourse, SessionState::LimitsEnabled) => "Disable Barriers",
            (LabKind::BarrierCourse, SessionState::LimitsDisabled) => "Enable Barriers",
            (LabKind::VehicleArena, SessionState::LimitsEnabled) => "Disable Limits",
            (LabKind::VehicleArena, SessionState::LimitsDisabled) => "Enable Limits",
        }
    }
}

/// Result of driving one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue(TickReport),
    /// The session is torn down; do not schedule another frame.
    Stopped,
}

/// Whatever outlives no single world but must be bound to one: the render
/// surface resources and the control panel window.
///
/// `acquire` runs after each build, `release` before each teardown. Every
/// successful `acquire` is matched by exactly one `release`.
pub trait SessionHost {
    fn acquire(&mut self, lab: &LabWorld) -> Result<(), SessionError>;
    fn release(&mut self);
}

/// Host with nothing to bind, for headless runs.
#[derive(Debug, Default)]
pub struct HeadlessHost;

impl SessionHost for HeadlessHost {
    fn acquire(&mut self, _lab: &LabWorld) -> Result<(), SessionError> {
        Ok(())
    }

    fn release(&mut self) {}
}

/// A running lab plus everything that survives rebuilds of it.
///
/// The only way the limits flag changes is [`Session::reconfigure`], which
/// tears the whole world down and builds a fresh one.
pub struct Session<H: SessionHost> {
    host: H,
    config: LabConfig,
    state: SessionState,
    input: InputState,
    world: Option<LabWorld>,
    sound: Option<Box<dyn SoundEffect>>,
    generation: u64,
}

impl<H: SessionHost> Session<H> {
    /// Build the lab and bind the host. Any failure here is fatal.
    pub fn start(mut host: H, config: LabConfig) -> Result<Self, SessionError> {
        let state = SessionState::from_flag(config.limits_enabled);
        let world = LabWorld::build(&config, state.is_enabled(), 0)?;
        host.acquire(&world)?;
        tracing::info!(lab = %config.kind, id = %world.id().short(), limits = state.is_enabled(), "session started");
        Ok(Self {
            host,
            config,
            state,
            input: InputState::new(),
            world: Some(world),
            sound: None,
            generation: 0,
        })
    }

    pub fn with_sound(mut self, sound: Box<dyn SoundEffect>) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn kind(&self) -> LabKind {
        self.config.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.world.is_some()
    }

    pub fn world(&self) -> Option<&LabWorld> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut LabWorld> {
        self.world.as_mut()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Host and running world together, for drawing a frame.
    pub fn host_and_world(&mut self) -> (&mut H, Option<&mut LabWorld>) {
        (&mut self.host, self.world.as_mut())
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn toggle_label(&self) -> &'static str {
        self.state.button_label(self.config.kind)
    }

    pub fn key_event(&mut self, key: Key, pressed: bool) {
        self.input.set(key, pressed);
    }

    pub fn handle(&mut self, action: Action) -> Result<(), SessionError> {
        match action {
            Action::Key { key, pressed } => self.key_event(key, pressed),
            Action::ToggleLimits => {
                self.reconfigure()?;
            }
            Action::PlaySound => {
                self.play_sound();
            }
            Action::SetParameter { name, value } => {
                let world = self.world.as_mut().ok_or(SessionError::Stopped)?;
                if world.panel_mut().set(name, value).is_none() {
                    tracing::warn!(name, "no such panel parameter");
                }
            }
        }
        Ok(())
    }

    /// Advance one frame by `elapsed` real seconds.
    pub fn tick(&mut self, elapsed: f32) -> Result<FrameStatus, SessionError> {
        match self.world.as_mut() {
            Some(world) => Ok(FrameStatus::Continue(world.tick(&self.input, elapsed)?)),
            None => Ok(FrameStatus::Stopped),
        }
    }

    /// Flip the limits flag: full teardown, then a full rebuild.
    pub fn reconfigure(&mut self) -> Result<SessionState, SessionError> {
        if self.world.is_none() {
            return Err(SessionError::Stopped);
        }
        let next = self.state.toggled();
        self.rebuild(self.config.clone(), next)?;
        tracing::info!(lab = %self.config.kind, limits = next.is_enabled(), generation = self.generation, "reconfigured");
        Ok(next)
    }

    /// Replace the running lab with another one.
    pub fn switch_lab(&mut self, config: LabConfig) -> Result<(), SessionError> {
        config.validate()?;
        let state = SessionState::from_flag(config.limits_enabled);
        self.rebuild(config, state)?;
        tracing::info!(lab = %self.config.kind, generation = self.generation, "switched lab");
        Ok(())
    }

    /// Tear down for good. Later ticks report [`FrameStatus::Stopped`].
    pub fn shutdown(&mut self) {
        if let Some(world) = self.world.take() {
            self.host.release();
            tracing::info!(lab = %world.kind(), id = %world.id().short(), ticks = world.ticks(), "session stopped");
        }
    }

    /// Play the lab's sound clip. Failures are logged and otherwise ignored.
    pub fn play_sound(&mut self) -> bool {
        let Some(path) = self.config.sound.as_deref() else {
            return false;
        };
        let Some(sound) = self.sound.as_mut() else {
            tracing::debug!("no sound output attached");
            return false;
        };
        match sound.play(path) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "sound playback failed");
                false
            }
        }
    }

    fn rebuild(&mut self, config: LabConfig, state: SessionState) -> Result<(), SessionError> {
        if self.world.take().is_some() {
            self.host.release();
        }
        self.input = InputState::new();
        self.generation += 1;
        self.config = config;
        self.state = state;

        let world = LabWorld::build(&self.config, state.is_enabled(), self.generation)?;
        self.host.acquire(&world)?;
        self.world = Some(world);
        Ok(())
    }
}

impl<H: SessionHost> Drop for Session<H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioError, SilentSound};
    use crate::control::ControlMode;
    use glam::Vec3;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Counts {
        acquired: u32,
        released: u32,
    }

    #[derive(Debug, Default, Clone)]
    struct CountingHost {
        counts: Rc<RefCell<Counts>>,
        fail: bool,
    }

    impl SessionHost for CountingHost {
        fn acquire(&mut self, _lab: &LabWorld) -> Result<(), SessionError> {
            if self.fail {
                return Err(SessionError::SurfaceUnavailable("no adapter".into()));
            }
            self.counts.borrow_mut().acquired += 1;
            Ok(())
        }

        fn release(&mut self) {
            self.counts.borrow_mut().released += 1;
        }
    }

    fn start(config: LabConfig) -> (Session<CountingHost>, Rc<RefCell<Counts>>) {
        let host = CountingHost::default();
        let counts = host.counts.clone();
        (Session::start(host, config).unwrap(), counts)
    }

    fn positions(session: &Session<CountingHost>) -> Vec<(&'static str, Vec3)> {
        let world = session.world().unwrap();
        world
            .entities()
            .iter()
            .map(|e| (e.name, world.physics().position(e.body).unwrap()))
            .collect()
    }

    #[test]
    fn toggle_twice_restores_initial_layout() {
        for config in [LabConfig::barrier_course(), LabConfig::vehicle_arena()] {
            let (mut session, _) = start(config);
            let initial = positions(&session);
            let initial_state = session.state();

            session.tick(1.0 / 60.0).unwrap();
            assert_eq!(session.reconfigure().unwrap(), initial_state.toggled());
            assert_eq!(session.reconfigure().unwrap(), initial_state);
            assert_eq!(positions(&session), initial);
            assert_eq!(session.generation(), 2);
            assert_eq!(session.world().unwrap().ticks(), 0);
        }
    }

    #[test]
    fn toggle_changes_barriers_and_label() {
        let (mut session, _) = start(LabConfig::barrier_course());
        assert_eq!(session.toggle_label(), "Disable Barriers");
        assert_eq!(session.world().unwrap().entities().len(), 5);

        session.handle(Action::ToggleLimits).unwrap();
        assert_eq!(session.state(), SessionState::LimitsDisabled);
        assert_eq!(session.toggle_label(), "Enable Barriers");
        assert_eq!(session.world().unwrap().entities().len(), 1);
    }

    #[test]
    fn toggle_hides_limits_box() {
        let (mut session, _) = start(LabConfig::vehicle_arena());
        assert_eq!(session.toggle_label(), "Disable Limits");
        session.reconfigure().unwrap();
        let world = session.world().unwrap();
        let arena = world.arena().unwrap();
        assert!(!arena.policy.enabled);
        assert!(!world.scene().mesh(arena.mesh).unwrap().visible);
        assert_eq!(session.toggle_label(), "Enable Limits");
    }

    #[test]
    fn host_acquire_release_balance() {
        let (mut session, counts) = start(LabConfig::vehicle_arena());
        session.reconfigure().unwrap();
        session.reconfigure().unwrap();
        session.switch_lab(LabConfig::barrier_course()).unwrap();
        assert_eq!(session.kind(), LabKind::BarrierCourse);
        {
            let c = counts.borrow();
            assert_eq!(c.acquired, 4);
            assert_eq!(c.released, 3);
        }
        drop(session);
        let c = counts.borrow();
        assert_eq!(c.acquired, c.released);
    }

    #[test]
    fn surface_failure_is_fatal_at_start() {
        let host = CountingHost {
            fail: true,
            ..CountingHost::default()
        };
        assert!(matches!(
            Session::start(host, LabConfig::barrier_course()),
            Err(SessionError::SurfaceUnavailable(_))
        ));
    }

    #[test]
    fn stopped_session_does_not_tick() {
        let (mut session, counts) = start(LabConfig::barrier_course());
        assert!(matches!(session.tick(0.016).unwrap(), FrameStatus::Continue(_)));
        session.shutdown();
        session.shutdown();
        assert_eq!(session.tick(0.016).unwrap(), FrameStatus::Stopped);
        assert!(matches!(session.reconfigure(), Err(SessionError::Stopped)));
        assert_eq!(counts.borrow().released, 1);
        drop(session);
        assert_eq!(counts.borrow().released, 1);
    }

    #[test]
    fn rebuild_clears_held_keys() {
        let (mut session, _) = start(LabConfig::barrier_course());
        session.key_event(Key::KeyD, true);
        session.reconfigure().unwrap();
        assert!(!session.input().is_pressed(Key::KeyD));
    }

    #[test]
    fn held_force_stays_bounded() {
        let (mut session, _) = start(LabConfig::barrier_course());
        session.handle(Action::Key {
            key: Key::KeyD,
            pressed: true,
        })
        .unwrap();
        let player = session.world().unwrap().entity("player").unwrap().body;
        let bound = 100.0 / 1.0 * (1.0 / 60.0) / (1.0 - 0.45);
        for _ in 0..60 {
            session.tick(1.0 / 60.0).unwrap();
            let v = session.world().unwrap().physics().velocity(player).unwrap();
            assert!(v.x > 0.0, "vx={}", v.x);
            assert!(v.x <= bound * 1.05, "vx={} bound={bound}", v.x);
        }
    }

    #[test]
    fn nudge_moves_car_per_tick() {
        let mut config = LabConfig::vehicle_arena();
        config.gravity = Vec3::ZERO;
        config.step_mode = crate::config::StepMode::Fixed;
        let (mut session, _) = start(config);
        let car = session.world().unwrap().entity("car").unwrap().body;
        let start_z = session.world().unwrap().physics().position(car).unwrap().z;
        session.key_event(Key::ArrowUp, true);
        for _ in 0..20 {
            session.tick(1.0 / 60.0).unwrap();
        }
        let z = session.world().unwrap().physics().position(car).unwrap().z;
        assert!((z - (start_z - 2.0)).abs() < 1e-3, "z={z}");
    }

    #[test]
    fn force_mode_can_drive_the_car() {
        let mut config = LabConfig::vehicle_arena();
        config.control = ControlMode::Force {
            magnitude: 50.0,
            damping: 0.9,
        };
        let (mut session, _) = start(config);
        session.key_event(Key::ArrowLeft, true);
        for _ in 0..30 {
            session.tick(1.0 / 60.0).unwrap();
        }
        let world = session.world().unwrap();
        let car = world.entity("car").unwrap().body;
        assert!(world.physics().velocity(car).unwrap().x < 0.0);
    }

    #[test]
    fn panel_action_updates_value() {
        let (mut session, _) = start(LabConfig::barrier_course());
        session
            .handle(Action::SetParameter {
                name: crate::lab::AMBIENT_PARAM,
                value: 1.5,
            })
            .unwrap();
        let v = session.world().unwrap().panel().get(crate::lab::AMBIENT_PARAM).unwrap();
        assert!((v - 1.5).abs() < 1e-5);
        session
            .handle(Action::SetParameter {
                name: "Fog",
                value: 1.0,
            })
            .unwrap();
    }

    struct BrokenSpeaker;

    impl SoundEffect for BrokenSpeaker {
        fn play(&mut self, path: &Path) -> Result<(), AudioError> {
            Err(AudioError::Playback {
                path: path.to_path_buf(),
                reason: "device busy".into(),
            })
        }
    }

    #[test]
    fn sound_failure_is_not_fatal() {
        let (session, _) = start(LabConfig::vehicle_arena());
        let mut session = session.with_sound(Box::new(BrokenSpeaker));
        session.handle(Action::PlaySound).unwrap();
        assert!(!session.play_sound());
        assert!(matches!(session.tick(1.0 / 60.0).unwrap(), FrameStatus::Continue(_)));
    }

    #[test]
    fn sound_plays_only_where_configured() {
        let (session, _) = start(LabConfig::vehicle_arena());
        let mut session = session.with_sound(Box::new(SilentSound::new()));
        assert!(session.play_sound());

        let (session, _) = start(LabConfig::barrier_course());
        let mut session = session.with_sound(Box::new(SilentSound::new()));
        assert!(!session.play_sound());
    }

    #[test]
    fn state_labels() {
        let s = SessionState::from_flag(true);
        assert_eq!(s.toggled().toggled(), s);
        assert_eq!(s.toggled().button_label(LabKind::VehicleArena), "Enable Limits");
    }
}
