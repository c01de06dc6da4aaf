//! Blockhop - a grid-based 2D platformer with an in-browser level editor
//!
//! Core modules:
//! - `sim`: Simulation core (objects, collision, player controller, level/editor)
//! - `renderer`: 2D draw context, tessellation and the WebGPU pipeline
//! - `platform`: Frame scheduling and input event mapping
//! - `persistence`: Request/response boundary to the level server
//! - `settings`: Engine configuration

pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::{Settings, ToleranceMode};

/// Engine configuration constants
pub mod consts {
    /// Grid cell size in world units. Also the default hitbox size.
    pub const OBJECT_UNIT: f32 = 32.0;

    /// Ticks per second the physics constants are tuned for
    pub const TICKS_PER_SECOND: f64 = 60.0;

    /// Player gravity (units/tick²)
    pub const GRAVITY: f32 = -1.35;
    /// Horizontal acceleration while airborne
    pub const ACC_X_AIR: f32 = 1.9;
    /// Horizontal acceleration while grounded
    pub const ACC_X_GROUND: f32 = 2.5;
    /// Friction applied without horizontal input while airborne
    pub const FRICTION_AIR: f32 = 0.25;
    /// Friction applied without horizontal input while grounded
    pub const FRICTION_GROUND: f32 = 0.45;
    /// Horizontal speed cap (both directions)
    pub const SPEED_CAP_X: f32 = 6.8;
    /// Vertical speed cap; also the jump impulse. Upward cap is twice this.
    pub const SPEED_CAP_Y: f32 = 14.0;

    /// Minimum collision band half-width for the velocity-scaled tolerance
    pub const MIN_TOLERANCE: f32 = 4.0;
    /// Collision band half-width for the fixed (legacy) tolerance
    pub const FIXED_TOLERANCE: f32 = 8.0;

    /// Rotation snap threshold (radians)
    pub const ROTATION_SNAP: f32 = 0.1;
    /// Squish easing step per rendered frame
    pub const SQUISH_STEP: f32 = 2.3;

    /// Death burst
    pub const DEATH_PARTICLES: usize = 15;
    pub const DEATH_PARTICLE_LIFE: f32 = 60.0;
    /// Victory burst
    pub const WIN_PARTICLES: usize = 25;
    pub const WIN_PARTICLE_LIFE: f32 = 90.0;
}

/// Clamp a value to be between min and max
#[inline]
pub fn clamp(num: f32, min: f32, max: f32) -> f32 {
    num.max(min).min(max)
}

/// Nearest multiple of a quarter turn
#[inline]
pub fn nearest_quarter_turn(angle: f32) -> f32 {
    use std::f32::consts::FRAC_PI_2;
    (angle / FRAC_PI_2).round() * FRAC_PI_2
}

/// Snap a world coordinate down to the grid
#[inline]
pub fn snap_to_grid(v: f32) -> f32 {
    (v / consts::OBJECT_UNIT).floor() * consts::OBJECT_UNIT
}
