//! Physics world service: rigid bodies, contacts and stepping.
//!
//! Collision detection, contact resolution and integration are all done by
//! `rapier3d`. This crate owns the pipeline wiring, the handle indirection
//! and the fixed-step accumulator.
//!
//! # Invariants
//! - Applied forces are one-shot: they are cleared after the next internal step.
//! - `step_with` never runs more than `max_substeps` internal steps per call.

mod body;
mod world;

pub use body::{BodyDesc, BodyHandle, BodyKind, ContactMaterial, Shape};
pub use world::{PhysicsError, PhysicsWorld};
