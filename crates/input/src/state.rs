use crate::key::Key;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Held-key map, written by key events and read once per tick.
///
/// Keys never seen read as released. Nothing clears the map except explicit
/// releases; a focus loss that swallows a key-up leaves the key held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    keys: BTreeMap<Key, bool>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key-down or key-up event.
    pub fn set(&mut self, key: Key, pressed: bool) {
        tracing::trace!(%key, pressed, "key event");
        self.keys.insert(key, pressed);
    }

    pub fn press(&mut self, key: Key) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.set(key, false);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys.get(&key).copied().unwrap_or(false)
    }

    /// Currently held keys in canonical order.
    pub fn pressed(&self) -> impl Iterator<Item = Key> + '_ {
        self.keys
            .iter()
            .filter_map(|(key, pressed)| pressed.then_some(*key))
    }
}

/// Which keys move a body along which world axis.
///
/// Forward is -Z, back +Z, left -X, right +X, matching a camera looking down
/// the negative Z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveBindings {
    pub forward: Key,
    pub back: Key,
    pub left: Key,
    pub right: Key,
}

impl MoveBindings {
    pub fn wasd() -> Self {
        Self {
            forward: Key::KeyW,
            back: Key::KeyS,
            left: Key::KeyA,
            right: Key::KeyD,
        }
    }

    pub fn arrows() -> Self {
        Self {
            forward: Key::ArrowUp,
            back: Key::ArrowDown,
            left: Key::ArrowLeft,
            right: Key::ArrowRight,
        }
    }

    /// Sum of the unit axes of every held movement key.
    ///
    /// Opposite keys cancel and diagonals are not normalized, so each key
    /// contributes the same amount regardless of what else is held.
    pub fn direction(&self, input: &InputState) -> Vec3 {
        let mut dir = Vec3::ZERO;
        if input.is_pressed(self.forward) {
            dir.z -= 1.0;
        }
        if input.is_pressed(self.back) {
            dir.z += 1.0;
        }
        if input.is_pressed(self.left) {
            dir.x -= 1.0;
        }
        if input.is_pressed(self.right) {
            dir.x += 1.0;
        }
        dir
    }
}
