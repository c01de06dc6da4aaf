//! Keyboard and pointer events to [`InputState`]
//!
//! Events are applied as they arrive with no debouncing. Key matching uses
//! physical key codes (`KeyboardEvent.code`) so layouts do not matter.

use crate::sim::input::InputState;

/// Game control a key maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Left,
    Right,
    Jump,
}

pub fn control_for(code: &str) -> Option<Control> {
    match code {
        "ArrowLeft" | "KeyA" => Some(Control::Left),
        "ArrowRight" | "KeyD" => Some(Control::Right),
        "ArrowUp" | "KeyW" | "Space" => Some(Control::Jump),
        _ => None,
    }
}

/// Apply a key press or release. Returns whether the key is a game control,
/// in which case the host should suppress its default action.
pub fn apply_key(input: &mut InputState, code: &str, pressed: bool) -> bool {
    match control_for(code) {
        Some(Control::Left) => input.left = pressed,
        Some(Control::Right) => input.right = pressed,
        Some(Control::Jump) => input.up = pressed,
        None => return false,
    }
    true
}

/// Pointer moved to canvas pixel `(x, y)`
pub fn apply_pointer_move(input: &mut InputState, x: f32, y: f32) {
    input.mouse_x = x;
    input.mouse_y = y;
}

/// Primary button pressed or released at canvas pixel `(x, y)`
pub fn apply_pointer_button(input: &mut InputState, x: f32, y: f32, down: bool) {
    apply_pointer_move(input, x, y);
    input.mouse_down = down;
}

/// Window lost focus: release everything so no key sticks
pub fn release_all(input: &mut InputState) {
    input.left = false;
    input.right = false;
    input.up = false;
    input.mouse_down = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let mut input = InputState::default();
        assert!(apply_key(&mut input, "KeyA", true));
        assert!(apply_key(&mut input, "Space", true));
        assert!(input.left && input.up);
        assert!(apply_key(&mut input, "ArrowLeft", false));
        assert!(!input.left);
        assert!(!apply_key(&mut input, "KeyQ", true));
    }

    #[test]
    fn test_pointer_and_blur() {
        let mut input = InputState::default();
        apply_pointer_button(&mut input, 10.0, 20.0, true);
        assert!(input.mouse_down);
        assert_eq!((input.mouse_x, input.mouse_y), (10.0, 20.0));
        apply_key(&mut input, "KeyD", true);
        release_all(&mut input);
        assert!(!input.right && !input.mouse_down);
        assert_eq!(input.mouse_x, 10.0);
    }
}
