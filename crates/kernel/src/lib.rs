//! Lab kernel: builds a physics lab, drives it frame by frame, and rebuilds it
//! when the barriers/limits flag flips.
//!
//! Per tick the order is fixed: input controller, physics step, arena clamp,
//! body-to-mesh sync, control panel, camera.
//!
//! # Invariants
//! - After a tick every tracked mesh has exactly its body's pose.
//! - With limits enabled, clamped bodies end the tick inside the arena on x and z.
//! - The limits flag changes only through a full teardown and rebuild.
//! - Every host `acquire` is matched by one `release`, whatever the exit path.

pub mod arena;
pub mod audio;
pub mod config;
pub mod control;
pub mod error;
pub mod inspect;
pub mod lab;
pub mod panel;
pub mod session;
pub mod sync;

pub use arena::{ArenaBounds, ArenaPolicy};
pub use audio::{AudioError, SilentSound, SoundEffect};
pub use config::{ConfigError, LabConfig, LabKind, StepMode};
pub use control::{ControlMode, Controller};
pub use error::SessionError;
pub use inspect::{EntityInfo, LabInspector, LabSnapshot, LabSummary};
pub use lab::{LabWorld, TickReport};
pub use panel::{ControlPanel, Parameter};
pub use session::{FrameStatus, HeadlessHost, Session, SessionHost, SessionState};
pub use sync::{Entity, LightAttachment, Synchronizer};
