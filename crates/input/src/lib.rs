//! Input: logical keys, held-key state and UI actions.
//!
//! # Invariants
//! - Key state is owned by whoever owns the [`InputState`]; there is no global map.
//! - A key stays pressed until an explicit release for that key arrives.
//! - Frontends (window, CLI script) produce the same [`Action`]s.

pub mod action;
pub mod key;
pub mod state;

pub use action::Action;
pub use key::{Key, KeyParseError};
pub use state::{InputState, MoveBindings};
