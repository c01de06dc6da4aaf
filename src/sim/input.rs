//! Per-tick input snapshot
//!
//! The platform layer owns a mutable `InputState` that key and mouse events
//! write into. Each frame it hands a copy to the level, so the simulation
//! never reads ambient state.

use serde::{Deserialize, Serialize};

/// Directional keys and pointer state, as of the start of a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub mouse_down: bool,
    /// Pointer position in canvas pixels (Y down)
    pub mouse_x: f32,
    pub mouse_y: f32,
}

impl InputState {
    /// Horizontal direction: -1, 0 or 1. Both keys held cancel out.
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Whether any horizontal key is held
    pub fn any_horizontal(&self) -> bool {
        self.left || self.right
    }

    pub fn with_pointer(mut self, x: f32, y: f32, down: bool) -> Self {
        self.mouse_x = x;
        self.mouse_y = y;
        self.mouse_down = down;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_cancels() {
        let input = InputState {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(input.horizontal(), 0.0);
        assert!(input.any_horizontal());
        assert_eq!(InputState::default().horizontal(), 0.0);
    }
}
