use crate::key::Key;

/// A high-level request any frontend (window, scripted CLI run) can produce.
///
/// The session consumes actions and key events, never raw window events, so
/// the desktop app and the headless runner drive the same logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// A movement key went down or up.
    Key { key: Key, pressed: bool },
    /// Flip the barriers/limits flag, rebuilding the lab.
    ToggleLimits,
    /// Fire the lab's one-shot sound effect.
    PlaySound,
    /// Set a control panel parameter by name.
    SetParameter { name: &'static str, value: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_action_carries_state() {
        let a = Action::Key {
            key: Key::KeyD,
            pressed: true,
        };
        assert!(matches!(a, Action::Key { pressed: true, .. }));
    }

    #[test]
    fn toggle_and_sound() {
        assert!(matches!(Action::ToggleLimits, Action::ToggleLimits));
        assert_ne!(Action::ToggleLimits, Action::PlaySound);
    }
}
