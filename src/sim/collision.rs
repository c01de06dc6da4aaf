//! Player contact detection against level objects and borders
//!
//! Contacts are recomputed from scratch every tick. A contact on a side is the
//! world coordinate of the surface the player touches on that side; the
//! player controller snaps to it. Detection is axis-aligned even when the
//! hitboxes carry an angle.
//!
//! Each side uses a tolerance band just past the opposing surface. The band
//! half-width grows with the player's speed along that axis so a fast-moving
//! player cannot skip over a thin surface in one tick.

use glam::Vec2;

use super::geometry::Hitbox;
use super::object::Collision;
use crate::consts::{FIXED_TOLERANCE, MIN_TOLERANCE, OBJECT_UNIT};
use crate::settings::ToleranceMode;

/// Surface coordinates the player is touching, per side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Contacts {
    pub above: Option<f32>,
    pub below: Option<f32>,
    pub left: Option<f32>,
    pub right: Option<f32>,
}

impl Contacts {
    pub fn grounded(&self) -> bool {
        self.below.is_some()
    }

    pub fn clear(&mut self) {
        *self = Contacts::default();
    }
}

/// Snapshot of another object, taken before the player moves
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub hitbox: Hitbox,
    pub collision: Collision,
    /// Object position, reported as the win target for goals
    pub origin: Vec2,
}

/// Everything the resolver found this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactReport {
    pub contacts: Contacts,
    /// At least one deadly object was touched. A flag rather than a count so
    /// several spikes in one tick still mean one death.
    pub deadly: bool,
    /// Position of a touched goal
    pub goal: Option<Vec2>,
}

/// Band half-width for one axis
#[inline]
pub fn tolerance(mode: ToleranceMode, speed_component: f32) -> f32 {
    match mode {
        ToleranceMode::VelocityScaled => speed_component.abs().max(MIN_TOLERANCE),
        ToleranceMode::Fixed => FIXED_TOLERANCE,
    }
}

/// Which sides of `player` touch `obj`, as the obj surface coordinate per side.
///
/// With `landing_wins`, a player sinking into the top of `obj` (or rising into
/// its bottom) within the vertical band gets no side contact from it. The
/// vertical overlap there is landing depth, not a wall.
fn touching_sides(
    player: &Hitbox,
    obj: &Hitbox,
    speed: Vec2,
    tol: Vec2,
    landing_wins: bool,
) -> Contacts {
    let same_x = player.overlaps_x(obj);
    let same_y = player.overlaps_y(obj);
    let band_x = 2.0 * tol.x;
    let band_y = 2.0 * tol.y;

    let mut sides = Contacts::default();
    if same_x && player.bottom() <= obj.top() && player.bottom() > obj.top() - band_y {
        sides.below = Some(obj.top());
    }
    if same_x && player.top() >= obj.bottom() && player.top() < obj.bottom() + band_y {
        sides.above = Some(obj.bottom());
    }

    let sinking_in = speed.y <= 0.0
        && player.bottom() < obj.top()
        && player.bottom() > obj.top() - band_y;
    let rising_in = speed.y > 0.0
        && player.top() > obj.bottom()
        && player.top() < obj.bottom() + band_y;
    let beside = same_y && !(landing_wins && (sinking_in || rising_in));

    if beside && player.left() <= obj.right() && player.left() > obj.right() - band_x {
        sides.left = Some(obj.right());
    }
    if beside && player.right() >= obj.left() && player.right() < obj.left() + band_x {
        sides.right = Some(obj.left());
    }
    sides
}

/// Resolve the player's contacts against every other object and the level
/// borders. All four sides are tested independently so corner contacts on
/// both axes register in the same tick.
pub fn resolve_contacts<'a, I>(
    player: &Hitbox,
    speed: Vec2,
    others: I,
    level_size: Vec2,
    mode: ToleranceMode,
) -> ContactReport
where
    I: IntoIterator<Item = &'a Collider>,
{
    let tol = Vec2::new(tolerance(mode, speed.x), tolerance(mode, speed.y));
    let mut report = ContactReport::default();

    for other in others {
        let landing_wins = other.collision == Collision::Solid;
        let sides = touching_sides(player, &other.hitbox, speed, tol, landing_wins);
        let touched = sides != Contacts::default();
        match other.collision {
            Collision::Solid => {
                // Last writer wins per side
                let c = &mut report.contacts;
                c.below = sides.below.or(c.below);
                c.above = sides.above.or(c.above);
                c.left = sides.left.or(c.left);
                c.right = sides.right.or(c.right);
            }
            Collision::Deadly if touched => report.deadly = true,
            Collision::Goal if touched => report.goal = Some(other.origin),
            _ => {}
        }
    }

    // Level borders are implicit solids one unit in from each edge. Any
    // penetration counts, however deep.
    let floor = OBJECT_UNIT;
    let ceiling = level_size.y - OBJECT_UNIT;
    let left_wall = OBJECT_UNIT;
    let right_wall = level_size.x - OBJECT_UNIT;
    let c = &mut report.contacts;
    if player.bottom() <= floor {
        c.below = Some(floor);
    }
    if player.top() >= ceiling {
        c.above = Some(ceiling);
    }
    if player.left() <= left_wall {
        c.left = Some(left_wall);
    }
    if player.right() >= right_wall {
        c.right = Some(right_wall);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: Vec2 = Vec2::new(640.0, 480.0);

    fn solid(x: f32, y: f32) -> Collider {
        Collider {
            hitbox: Hitbox::new(x, y, OBJECT_UNIT, OBJECT_UNIT, 0.0),
            collision: Collision::Solid,
            origin: Vec2::new(x, y),
        }
    }

    fn player_at(x: f32, y: f32) -> Hitbox {
        Hitbox::new(x, y, OBJECT_UNIT, OBJECT_UNIT, 0.0)
    }

    #[test]
    fn test_tolerance_modes() {
        assert_eq!(tolerance(ToleranceMode::VelocityScaled, 0.5), MIN_TOLERANCE);
        assert_eq!(tolerance(ToleranceMode::VelocityScaled, -10.0), 10.0);
        assert_eq!(tolerance(ToleranceMode::Fixed, 20.0), FIXED_TOLERANCE);
    }

    #[test]
    fn test_standing_on_block() {
        let blocks = [solid(96.0, 64.0)];
        let report = resolve_contacts(
            &player_at(96.0, 96.0),
            Vec2::ZERO,
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.below, Some(96.0));
        assert_eq!(report.contacts.above, None);
    }

    #[test]
    fn test_slightly_sunk_into_block() {
        let blocks = [solid(96.0, 64.0)];
        let report = resolve_contacts(
            &player_at(100.0, 93.0),
            Vec2::new(0.0, -3.0),
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.below, Some(96.0));
    }

    #[test]
    fn test_fast_fall_widens_band() {
        let blocks = [solid(96.0, 64.0)];
        // 12 units deep: outside the minimum band, inside the speed band
        let player = player_at(96.0, 84.0);
        let slow = resolve_contacts(&player, Vec2::ZERO, &blocks, LEVEL, ToleranceMode::VelocityScaled);
        assert_eq!(slow.contacts.below, None);
        let fast = resolve_contacts(
            &player,
            Vec2::new(0.0, -14.0),
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(fast.contacts.below, Some(96.0));
    }

    #[test]
    fn test_corner_contacts_both_axes() {
        // One block under the player, one against its right side
        let blocks = [solid(96.0, 64.0), solid(128.0, 96.0)];
        let report = resolve_contacts(
            &player_at(96.0, 96.0),
            Vec2::ZERO,
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.below, Some(96.0));
        assert_eq!(report.contacts.right, Some(128.0));
    }

    #[test]
    fn test_floor_blocks_do_not_touch_sides() {
        let blocks = [solid(64.0, 64.0), solid(128.0, 64.0)];
        let report = resolve_contacts(
            &player_at(96.0, 96.0),
            Vec2::ZERO,
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.left, None);
        assert_eq!(report.contacts.right, None);
    }

    #[test]
    fn test_landing_across_seam_is_not_a_wall() {
        // Straddling two floor blocks after sinking into them while running right
        let blocks = [solid(96.0, 64.0), solid(128.0, 64.0)];
        let report = resolve_contacts(
            &player_at(100.0, 86.0),
            Vec2::new(6.8, -12.0),
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.below, Some(96.0));
        assert_eq!(report.contacts.right, None);
        assert_eq!(report.contacts.left, None);
    }

    #[test]
    fn test_wall_beside_landing_still_blocks() {
        // Falling next to a two-high wall: the wall top is far above the feet
        let blocks = [solid(96.0, 64.0), solid(128.0, 96.0), solid(128.0, 128.0)];
        let report = resolve_contacts(
            &player_at(100.0, 86.0),
            Vec2::new(6.8, -12.0),
            &blocks,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.below, Some(96.0));
        assert_eq!(report.contacts.right, Some(128.0));
    }

    #[test]
    fn test_sinking_onto_spike_still_touches() {
        let others = [Collider {
            hitbox: Hitbox::new(128.0, 64.0, OBJECT_UNIT, 8.0, 0.0),
            collision: Collision::Deadly,
            origin: Vec2::new(128.0, 64.0),
        }];
        // Feet level with the strip, right edge flush with its left end
        let report = resolve_contacts(
            &player_at(96.0, 68.0),
            Vec2::new(6.8, -6.0),
            &others,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert!(report.deadly);
    }

    #[test]
    fn test_deadly_and_goal_flags() {
        let others = [
            Collider {
                hitbox: Hitbox::new(104.0, 64.0, 16.0, 16.0, 0.0),
                collision: Collision::Deadly,
                origin: Vec2::new(96.0, 64.0),
            },
            Collider {
                hitbox: Hitbox::new(128.0, 80.0, OBJECT_UNIT, OBJECT_UNIT, 0.0),
                collision: Collision::Goal,
                origin: Vec2::new(128.0, 80.0),
            },
        ];
        let report = resolve_contacts(
            &player_at(96.0, 80.0),
            Vec2::ZERO,
            &others,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert!(report.deadly);
        assert_eq!(report.goal, Some(Vec2::new(128.0, 80.0)));
        // Deadly and goal objects are not surfaces
        assert_eq!(report.contacts.below, None);
        assert_eq!(report.contacts.right, None);
    }

    #[test]
    fn test_borders_catch_any_depth() {
        let none: [Collider; 0] = [];
        let report = resolve_contacts(
            &player_at(-200.0, -500.0),
            Vec2::ZERO,
            &none,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.left, Some(OBJECT_UNIT));
        assert_eq!(report.contacts.below, Some(OBJECT_UNIT));

        let report = resolve_contacts(
            &player_at(LEVEL.x - 40.0, LEVEL.y - 40.0),
            Vec2::ZERO,
            &none,
            LEVEL,
            ToleranceMode::VelocityScaled,
        );
        assert_eq!(report.contacts.right, Some(LEVEL.x - OBJECT_UNIT));
        assert_eq!(report.contacts.above, Some(LEVEL.y - OBJECT_UNIT));
    }

    #[test]
    fn test_fixed_band_legacy() {
        let blocks = [solid(96.0, 64.0)];
        // 12 units deep is inside the fixed 16-unit band regardless of speed
        let report = resolve_contacts(
            &player_at(96.0, 84.0),
            Vec2::ZERO,
            &blocks,
            LEVEL,
            ToleranceMode::Fixed,
        );
        assert_eq!(report.contacts.below, Some(96.0));
    }
}
