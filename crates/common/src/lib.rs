//! Shared types for the physlab workspace.
//!
//! Everything here is plain data: no physics, no rendering.

mod types;

pub use types::{Pose, SessionId, Transform};
