//! Axis-aligned hitboxes
//!
//! World space has Y increasing upward, so `bottom` is `y` and `top` is
//! `y + height`. The angle is carried for rendering only; every overlap test
//! here ignores it.

use serde::{Deserialize, Serialize};

/// An object hitbox, potentially rotated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl Hitbox {
    pub const fn new(x: f32, y: f32, width: f32, height: f32, angle: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            angle,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y
    }

    #[inline]
    pub fn mid_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Inclusive point containment
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.left() && px <= self.right() && py >= self.bottom() && py <= self.top()
    }

    /// Copy of this box moved by an offset. The receiver is left untouched.
    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Horizontal ranges overlap (open intervals)
    #[inline]
    pub fn overlaps_x(&self, other: &Hitbox) -> bool {
        self.right() > other.left() && self.left() < other.right()
    }

    /// Vertical ranges overlap (open intervals)
    #[inline]
    pub fn overlaps_y(&self, other: &Hitbox) -> bool {
        self.top() > other.bottom() && self.bottom() < other.top()
    }
}
