//! Player controller
//!
//! A small state machine driven once per tick by the level:
//! - normal: gravity, run/jump input, friction, speed caps, contact snapping
//! - winning: physics off, the player glides into the goal while spinning
//!   and shrinking
//!
//! Death is not a state. The controller reports it and the level resets the
//! player synchronously.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{ContactReport, Contacts};
use super::input::InputState;
use crate::consts::*;
use crate::{clamp, nearest_quarter_turn};

/// Player cosmetic variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    /// Rounded square with a pink-to-blue gradient
    #[default]
    Gradient,
    /// Round variant. Rotation-invariant, so it always rolls and never snaps.
    Ball,
}

impl Icon {
    /// Parse a preference string. Unknown names fall back to the default.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gradient" => Icon::Gradient,
            "ball" => Icon::Ball,
            other => {
                log::warn!("Unknown player icon {other:?}, using default");
                Icon::Gradient
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Icon::Gradient => "gradient",
            Icon::Ball => "ball",
        }
    }
}

/// The icon preference is fetched after the player exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cosmetic {
    #[default]
    Pending,
    Resolved(Icon),
}

impl Cosmetic {
    /// Icon to draw and to apply physics quirks for (default while pending)
    pub fn resolved(&self) -> Icon {
        match self {
            Cosmetic::Pending => Icon::default(),
            Cosmetic::Resolved(icon) => *icon,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Cosmetic::Pending)
    }
}

/// Position and rotation of the player object, copied in and out of the level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub pos: Vec2,
    pub rotation: f32,
}

/// What the level must do after a player tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Continue,
    /// Touched something deadly. Nothing moved this tick.
    Died,
    /// Touched the goal at the given position
    ReachedGoal(Vec2),
}

/// Player-specific state
#[derive(Debug, Clone)]
pub struct Player {
    pub speed: Vec2,
    pub acc: Vec2,
    /// Visual stretch driver, eased toward `speed`
    pub squish: Vec2,
    pub contacts: Contacts,
    /// Goal position while the win animation plays
    pub winning: Option<Vec2>,
    /// Render scale during the win animation (1 = normal)
    pub win_scale: f32,
    pub icon: Cosmetic,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            speed: Vec2::ZERO,
            acc: Vec2::ZERO,
            squish: Vec2::ZERO,
            contacts: Contacts::default(),
            winning: None,
            win_scale: 1.0,
            icon: Cosmetic::Pending,
        }
    }
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grounded(&self) -> bool {
        self.contacts.grounded()
    }

    pub fn is_winning(&self) -> bool {
        self.winning.is_some()
    }

    /// Advance one tick. `report` must have been computed from the pose at the
    /// start of this tick.
    pub fn tick(
        &mut self,
        pose: &mut Pose,
        report: &ContactReport,
        input: &InputState,
        delta: f32,
    ) -> TickOutcome {
        if let Some(target) = self.winning {
            self.tick_winning(pose, target, delta);
            return TickOutcome::Continue;
        }

        self.contacts = report.contacts;
        if report.deadly {
            return TickOutcome::Died;
        }
        if let Some(goal) = report.goal {
            return TickOutcome::ReachedGoal(goal);
        }

        let grounded = self.contacts.grounded();
        let icon = self.icon.resolved();
        let (slow_down, acc_x) = if grounded {
            (FRICTION_GROUND, ACC_X_GROUND)
        } else {
            (FRICTION_AIR, ACC_X_AIR)
        };

        self.acc.y = GRAVITY;
        self.acc.x = input.horizontal() * acc_x;

        self.speed += self.acc * delta;

        // Slow down x speed if no buttons are pressed
        if !input.any_horizontal() {
            let decay = slow_down * delta;
            if self.speed.x.abs() <= decay {
                self.speed.x = 0.0;
            } else {
                self.speed.x -= decay * self.speed.x.signum();
            }
            if self.speed.x.abs() <= slow_down {
                self.speed.x = 0.0;
            }
        }

        if input.up && self.speed.y <= 0.0 && grounded {
            self.speed.y = SPEED_CAP_Y;
        }

        self.speed.x = clamp(self.speed.x, -SPEED_CAP_X, SPEED_CAP_X);
        self.speed.y = clamp(self.speed.y, -SPEED_CAP_Y, SPEED_CAP_Y * 2.0);

        self.resolve_contacts(pose);

        if grounded && !input.up && icon != Icon::Ball {
            let target = nearest_quarter_turn(pose.rotation);
            pose.rotation += (target - pose.rotation) / 2.0;
            if (pose.rotation - target).abs() <= ROTATION_SNAP {
                pose.rotation = target;
            }
        }

        pose.pos += self.speed * delta;

        if !grounded || icon == Icon::Ball {
            pose.rotation -= self.speed.x / 40.0 * delta;
        }

        self.ease_squish();
        TickOutcome::Continue
    }

    /// Snap onto touched surfaces, but only on sides the player is moving
    /// toward (or resting against)
    fn resolve_contacts(&mut self, pose: &mut Pose) {
        let c = self.contacts;
        if let Some(floor) = c.below {
            if self.speed.y <= 0.0 {
                pose.pos.y = floor;
                self.speed.y = 0.0;
            }
        }
        if let Some(ceiling) = c.above {
            if self.speed.y > 0.0 {
                pose.pos.y = ceiling - OBJECT_UNIT;
                self.speed.y = 0.0;
            }
        }
        if let Some(wall) = c.left {
            if self.speed.x <= 0.0 {
                pose.pos.x = wall;
                self.speed.x = 0.0;
            }
        }
        if let Some(wall) = c.right {
            if self.speed.x >= 0.0 {
                pose.pos.x = wall - OBJECT_UNIT;
                self.speed.x = 0.0;
            }
        }
    }

    fn tick_winning(&mut self, pose: &mut Pose, target: Vec2, delta: f32) {
        let t = (0.1 * delta).min(1.0);
        pose.pos += (target - pose.pos) * t;
        pose.rotation += 0.15 * delta;
        self.win_scale = (self.win_scale - 0.015 * delta).max(0.0);
        self.ease_squish();
    }

    /// Secondary oscillator for squash and stretch. Never feeds back into
    /// physics.
    fn ease_squish(&mut self) {
        if self.squish.y < self.speed.y {
            self.squish.y += SQUISH_STEP;
        } else if self.squish.y > self.speed.y {
            self.squish.y -= SQUISH_STEP;
        }
        if (self.squish.y - self.speed.y).abs() <= SQUISH_STEP {
            self.squish.y = self.speed.y;
        }
    }

    /// Render scale derived from squish
    pub fn squish_scale(&self) -> (f32, f32) {
        (
            1.0 - clamp(self.squish.y * 0.02, -0.1, 0.5),
            1.0 - clamp(self.squish.x * 0.02, -0.1, 0.5),
        )
    }

    /// Stop all motion after a death
    pub fn kill(&mut self, pose: &mut Pose) {
        self.acc = Vec2::ZERO;
        self.speed = Vec2::ZERO;
        self.contacts.clear();
        pose.rotation = 0.0;
    }

    /// Start the win animation. Returns false if it was already running.
    pub fn begin_win(&mut self, goal: Vec2) -> bool {
        if self.winning.is_some() {
            return false;
        }
        self.acc = Vec2::ZERO;
        self.speed = Vec2::ZERO;
        self.winning = Some(goal);
        true
    }

    /// Back to a standing start (level reset, playtest start/stop)
    pub fn reset_motion(&mut self) {
        self.speed = Vec2::ZERO;
        self.acc = Vec2::ZERO;
        self.squish = Vec2::ZERO;
        self.contacts.clear();
        self.winning = None;
        self.win_scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pose(x: f32, y: f32) -> Pose {
        Pose {
            pos: Vec2::new(x, y),
            rotation: 0.0,
        }
    }

    fn grounded_at(y: f32) -> ContactReport {
        ContactReport {
            contacts: Contacts {
                below: Some(y),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_grounded_jump() {
        let mut player = Player::new();
        let mut p = pose(64.0, 32.0);
        let input = InputState {
            up: true,
            ..Default::default()
        };
        let out = player.tick(&mut p, &grounded_at(32.0), &input, 1.0);
        assert_eq!(out, TickOutcome::Continue);
        assert_eq!(player.speed.y, SPEED_CAP_Y);
        assert_eq!(p.pos.y, 32.0 + SPEED_CAP_Y);
    }

    #[test]
    fn test_no_jump_in_air() {
        let mut player = Player::new();
        let mut p = pose(64.0, 200.0);
        let input = InputState {
            up: true,
            ..Default::default()
        };
        player.tick(&mut p, &ContactReport::default(), &input, 1.0);
        assert_eq!(player.speed.y, GRAVITY);
    }

    #[test]
    fn test_landing_zeroes_fall() {
        let mut player = Player::new();
        player.speed.y = -10.0;
        let mut p = pose(64.0, 28.0);
        player.tick(&mut p, &grounded_at(32.0), &InputState::default(), 1.0);
        assert_eq!(p.pos.y, 32.0);
        assert_eq!(player.speed.y, 0.0);
    }

    #[test]
    fn test_ceiling_stops_rise() {
        let mut player = Player::new();
        player.speed.y = 10.0;
        let mut p = pose(64.0, 100.0);
        let report = ContactReport {
            contacts: Contacts {
                above: Some(130.0),
                ..Default::default()
            },
            ..Default::default()
        };
        player.tick(&mut p, &report, &InputState::default(), 1.0);
        assert_eq!(player.speed.y, 0.0);
        assert_eq!(p.pos.y, 130.0 - OBJECT_UNIT);
    }

    #[test]
    fn test_wall_stops_run() {
        let mut player = Player::new();
        player.speed.x = 5.0;
        let mut p = pose(100.0, 32.0);
        let mut report = grounded_at(32.0);
        report.contacts.right = Some(132.0);
        let input = InputState {
            right: true,
            ..Default::default()
        };
        player.tick(&mut p, &report, &input, 1.0);
        assert_eq!(player.speed.x, 0.0);
        assert_eq!(p.pos.x, 100.0);
    }

    #[test]
    fn test_rotation_snaps_on_ground() {
        let mut player = Player::new();
        let mut p = pose(64.0, 32.0);
        p.rotation = 0.3;
        player.tick(&mut p, &grounded_at(32.0), &InputState::default(), 1.0);
        assert!((p.rotation - 0.15).abs() < 1e-6);
        player.tick(&mut p, &grounded_at(32.0), &InputState::default(), 1.0);
        assert_eq!(p.rotation, 0.0);
    }

    #[test]
    fn test_ball_keeps_rolling() {
        let mut player = Player::new();
        player.icon = Cosmetic::Resolved(Icon::Ball);
        let mut p = pose(64.0, 32.0);
        let input = InputState {
            right: true,
            ..Default::default()
        };
        player.tick(&mut p, &grounded_at(32.0), &input, 1.0);
        assert!(p.rotation < 0.0);
    }

    #[test]
    fn test_airborne_lean() {
        let mut player = Player::new();
        player.speed.x = 4.0;
        let mut p = pose(64.0, 200.0);
        let input = InputState {
            right: true,
            ..Default::default()
        };
        player.tick(&mut p, &ContactReport::default(), &input, 1.0);
        let expected = -(4.0 + ACC_X_AIR) / 40.0;
        assert!((p.rotation - expected).abs() < 1e-6);
    }

    #[test]
    fn test_death_reported_before_motion() {
        let mut player = Player::new();
        player.speed = Vec2::new(3.0, -5.0);
        let mut p = pose(64.0, 90.0);
        let report = ContactReport {
            deadly: true,
            ..Default::default()
        };
        let out = player.tick(&mut p, &report, &InputState::default(), 1.0);
        assert_eq!(out, TickOutcome::Died);
        assert_eq!(p.pos, Vec2::new(64.0, 90.0));
        player.kill(&mut p);
        assert_eq!(player.speed, Vec2::ZERO);
    }

    #[test]
    fn test_win_is_idempotent_and_animates() {
        let mut player = Player::new();
        player.speed = Vec2::new(3.0, 3.0);
        let goal = Vec2::new(320.0, 64.0);
        assert!(player.begin_win(goal));
        assert!(!player.begin_win(Vec2::ZERO));
        assert_eq!(player.winning, Some(goal));
        assert_eq!(player.speed, Vec2::ZERO);

        let mut p = pose(288.0, 64.0);
        for _ in 0..200 {
            player.tick(&mut p, &ContactReport::default(), &InputState::default(), 1.0);
        }
        assert!((p.pos - goal).length() < 0.5);
        assert_eq!(player.win_scale, 0.0);
        assert_eq!(player.speed, Vec2::ZERO);
    }

    #[test]
    fn test_squish_eases_toward_speed() {
        let mut player = Player::new();
        player.speed.y = 10.0;
        player.ease_squish();
        assert_eq!(player.squish.y, SQUISH_STEP);
        for _ in 0..10 {
            player.ease_squish();
        }
        assert_eq!(player.squish.y, 10.0);
        let (sx, _) = player.squish_scale();
        assert!((sx - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_icon_names() {
        assert_eq!(Icon::from_name("ball"), Icon::Ball);
        assert_eq!(Icon::from_name(" Gradient "), Icon::Gradient);
        assert_eq!(Icon::from_name("sparkles"), Icon::Gradient);
        assert_eq!(Cosmetic::Pending.resolved(), Icon::Gradient);
    }

    proptest! {
        #[test]
        fn prop_speed_is_clamped(
            sx in -100.0f32..100.0,
            sy in -100.0f32..100.0,
            left in any::<bool>(),
            right in any::<bool>(),
            up in any::<bool>(),
            on_ground in any::<bool>(),
            delta in 0.1f32..10.0,
        ) {
            let mut player = Player::new();
            player.speed = Vec2::new(sx, sy);
            let mut p = pose(200.0, 200.0);
            let report = if on_ground { grounded_at(200.0) } else { ContactReport::default() };
            let input = InputState { left, right, up, ..Default::default() };
            player.tick(&mut p, &report, &input, delta);
            prop_assert!(player.speed.x.abs() <= SPEED_CAP_X);
            prop_assert!(player.speed.y >= -SPEED_CAP_Y && player.speed.y <= SPEED_CAP_Y * 2.0);
        }

        #[test]
        fn prop_friction_snaps_to_zero(sx in -FRICTION_GROUND..=FRICTION_GROUND, delta in 0.1f32..3.0) {
            let mut player = Player::new();
            player.speed.x = sx;
            let mut p = pose(200.0, 32.0);
            player.tick(&mut p, &grounded_at(32.0), &InputState::default(), delta);
            prop_assert_eq!(player.speed.x, 0.0);
        }

        #[test]
        fn prop_grounded_jump_is_exact(sy in -14.0f32..=0.0, delta in 0.1f32..3.0) {
            let mut player = Player::new();
            player.speed.y = sy;
            let mut p = pose(200.0, 32.0);
            let input = InputState { up: true, ..Default::default() };
            player.tick(&mut p, &grounded_at(32.0), &input, delta);
            prop_assert_eq!(player.speed.y, SPEED_CAP_Y);
        }
    }
}
