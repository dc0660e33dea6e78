use glam::Vec3;
use physlab_input::{InputState, MoveBindings};
use physlab_physics::{BodyHandle, PhysicsError, PhysicsWorld};
use serde::{Deserialize, Serialize};

/// How held movement keys act on the controlled body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ControlMode {
    /// Push with `magnitude` newtons per held key, then scale horizontal
    /// velocity by `damping`. The damping is the only horizontal friction the
    /// body gets from input handling; vertical velocity is left to gravity.
    Force { magnitude: f32, damping: f32 },
    /// Move the body `step` units per held key per tick by writing its
    /// position directly.
    ///
    /// This skips the velocity model: the contact solver only sees the body
    /// after it has already been teleported, so at high input rates it can
    /// tunnel through thin static bodies. Use `Force` when collision response
    /// against the controlled body matters.
    Nudge { step: f32 },
}

impl ControlMode {
    pub fn is_valid(&self) -> bool {
        match *self {
            ControlMode::Force { magnitude, damping } => {
                magnitude.is_finite() && (0.0..1.0).contains(&damping)
            }
            ControlMode::Nudge { step } => step.is_finite() && step >= 0.0,
        }
    }
}

/// Maps the held-key state onto one body, once per tick, before the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Controller {
    pub body: BodyHandle,
    pub bindings: MoveBindings,
    pub mode: ControlMode,
}

impl Controller {
    pub fn new(body: BodyHandle, bindings: MoveBindings, mode: ControlMode) -> Self {
        Self {
            body,
            bindings,
            mode,
        }
    }

    pub fn apply(&self, input: &InputState, world: &mut PhysicsWorld) -> Result<(), PhysicsError> {
        let dir = self.bindings.direction(input);
        match self.mode {
            ControlMode::Force { magnitude, damping } => {
                if dir != Vec3::ZERO {
                    world.apply_force(self.body, dir * magnitude)?;
                }
                let v = world.velocity(self.body)?;
                world.set_velocity(self.body, Vec3::new(v.x * damping, v.y, v.z * damping))?;
            }
            ControlMode::Nudge { step } => {
                if dir != Vec3::ZERO {
                    let p = world.position(self.body)?;
                    world.set_position(self.body, p + dir * step)?;
                }
            }
        }
        Ok(())
    }
}
