//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame timing and render-loop ownership
//! - Input events

pub mod frame;
pub mod keys;

pub use frame::{FpsCounter, FrameClock, RenderLoop};
pub use keys::{Control, apply_key, apply_pointer_button, apply_pointer_move, release_all};
