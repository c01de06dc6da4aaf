//! Game objects: a closed set of kinds plus a per-kind behavior table
//!
//! Everything that varies by kind but not by instance (collision class,
//! object-local hitbox, whether the editor may delete or place it) lives in
//! [`ObjectType::behavior`]. Per-instance state lives in [`ObjectKind`].
//! Adding a kind means adding a tag, a table row and a render arm.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::Hitbox;
use super::particles::ParticleEmitter;
use super::player::{Icon, Player};
use crate::consts::OBJECT_UNIT;
use crate::renderer::canvas::{DrawContext, Fill};
use crate::renderer::vertex::colors;

/// Object type tag. The wire names are part of the level format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    Block,
    Spike,
    GroundSpike,
    Goal,
    Player,
    Particles,
}

/// How the player reacts when touching an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collision {
    Deco,
    Solid,
    Deadly,
    Goal,
}

/// Static per-type data
#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub collision: Collision,
    /// Object-local hitbox as (x, y, width, height); `None` for no hitbox
    pub hitbox: Option<(f32, f32, f32, f32)>,
    /// Whether the eraser may remove it
    pub deletable: bool,
    /// Whether it may appear in a persisted `objects` list
    pub persisted: bool,
}

const U: f32 = OBJECT_UNIT;

const BLOCK: Behavior = Behavior {
    collision: Collision::Solid,
    hitbox: Some((0.0, 0.0, U, U)),
    deletable: true,
    persisted: true,
};
const SPIKE: Behavior = Behavior {
    collision: Collision::Deadly,
    hitbox: Some((U / 4.0, 0.0, U / 2.0, U / 2.0)),
    deletable: true,
    persisted: true,
};
const GROUND_SPIKE: Behavior = Behavior {
    collision: Collision::Deadly,
    hitbox: Some((U / 8.0, 0.0, U * 0.75, U / 4.0)),
    deletable: true,
    persisted: true,
};
const GOAL: Behavior = Behavior {
    collision: Collision::Goal,
    hitbox: Some((0.0, 0.0, U, U)),
    deletable: false,
    persisted: false,
};
const PLAYER: Behavior = Behavior {
    collision: Collision::Deco,
    hitbox: Some((0.0, 0.0, U, U)),
    deletable: false,
    persisted: false,
};
const PARTICLES: Behavior = Behavior {
    collision: Collision::Deco,
    hitbox: None,
    deletable: false,
    persisted: false,
};

impl ObjectType {
    /// All types the editor can place
    pub const PLACEABLE: [ObjectType; 3] =
        [ObjectType::Block, ObjectType::Spike, ObjectType::GroundSpike];

    pub fn behavior(self) -> &'static Behavior {
        match self {
            ObjectType::Block => &BLOCK,
            ObjectType::Spike => &SPIKE,
            ObjectType::GroundSpike => &GROUND_SPIKE,
            ObjectType::Goal => &GOAL,
            ObjectType::Player => &PLAYER,
            ObjectType::Particles => &PARTICLES,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Block => "block",
            ObjectType::Spike => "spike",
            ObjectType::GroundSpike => "ground-spike",
            ObjectType::Goal => "goal",
            ObjectType::Player => "player",
            ObjectType::Particles => "particles",
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// A type that only the level itself may create was requested for a
    /// generic slot (persisted data or an editor placement)
    #[error("illegal object type {0}")]
    IllegalType(ObjectType),
}

/// Stable handle to an object in a level. Never reused within a level, so a
/// handle to a removed object simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Per-instance state for each kind
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Block,
    Spike,
    GroundSpike,
    Goal,
    Particles(ParticleEmitter),
    Player(Player),
}

impl ObjectKind {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectKind::Block => ObjectType::Block,
            ObjectKind::Spike => ObjectType::Spike,
            ObjectKind::GroundSpike => ObjectType::GroundSpike,
            ObjectKind::Goal => ObjectType::Goal,
            ObjectKind::Particles(_) => ObjectType::Particles,
            ObjectKind::Player(_) => ObjectType::Player,
        }
    }

    /// Construct a kind for a generic placement slot
    pub fn from_placeable(ty: ObjectType) -> Result<Self, ObjectError> {
        match ty {
            ObjectType::Block => Ok(ObjectKind::Block),
            ObjectType::Spike => Ok(ObjectKind::Spike),
            ObjectType::GroundSpike => Ok(ObjectKind::GroundSpike),
            ObjectType::Goal | ObjectType::Player | ObjectType::Particles => {
                Err(ObjectError::IllegalType(ty))
            }
        }
    }
}

/// An object within a level
#[derive(Debug, Clone)]
pub struct GameObject {
    pub id: ObjectId,
    pub x: f32,
    pub y: f32,
    /// Radians; used for rendering and player lean
    pub rotation: f32,
    pub kind: ObjectKind,
}

impl GameObject {
    pub fn new(id: ObjectId, kind: ObjectKind, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            rotation: 0.0,
            kind,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    pub fn behavior(&self) -> &'static Behavior {
        self.object_type().behavior()
    }

    pub fn collision(&self) -> Collision {
        self.behavior().collision
    }

    pub fn deletable(&self) -> bool {
        self.behavior().deletable
    }

    /// Object-local hitbox. A fresh value every call.
    pub fn hitbox(&self) -> Option<Hitbox> {
        self.behavior()
            .hitbox
            .map(|(x, y, w, h)| Hitbox::new(x, y, w, h, self.rotation))
    }

    /// Hitbox translated to world coordinates
    pub fn abs_hitbox(&self) -> Option<Hitbox> {
        self.hitbox().map(|b| b.translated(self.x, self.y))
    }

    /// Full grid cell under the object, used by the editor for picking so
    /// small hitboxes (spikes) are still easy to grab
    pub fn grid_hitbox(&self) -> Option<Hitbox> {
        self.behavior()
            .hitbox
            .map(|_| Hitbox::new(self.x, self.y, OBJECT_UNIT, OBJECT_UNIT, self.rotation))
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.kind {
            ObjectKind::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.kind {
            ObjectKind::Player(p) => Some(p),
            _ => None,
        }
    }

    /// Draw the object. Shapes are centred on the grid cell so rotation pivots
    /// around the middle.
    pub fn render(&self, ctx: &mut DrawContext, reduced_motion: bool) {
        let half = OBJECT_UNIT / 2.0;
        match &self.kind {
            ObjectKind::Block => {
                ctx.save();
                ctx.translate(self.x + half, self.y + half);
                ctx.rotate(self.rotation);
                let rect = ctx.round_rect_path(-half, -half, OBJECT_UNIT, OBJECT_UNIT, 3.0);
                ctx.fill_path(&rect, shade_gradient());
                ctx.stroke_path(&rect, 2.0, colors::OUTLINE, true);
                ctx.restore();
            }
            ObjectKind::Spike => {
                ctx.save();
                ctx.translate(self.x + half, self.y + half);
                ctx.rotate(self.rotation);
                let tri = [
                    glam::Vec2::new(-half, -half),
                    glam::Vec2::new(0.0, half),
                    glam::Vec2::new(half, -half),
                ];
                ctx.fill_path(&tri, shade_gradient());
                ctx.stroke_path(&tri, 2.0, colors::OUTLINE, false);
                ctx.restore();
            }
            ObjectKind::GroundSpike => {
                ctx.save();
                ctx.translate(self.x + half, self.y + half);
                ctx.rotate(self.rotation);
                let teeth = 4;
                let tooth = OBJECT_UNIT * 0.75 / teeth as f32;
                let start = -OBJECT_UNIT * 0.375;
                for i in 0..teeth {
                    let x0 = start + i as f32 * tooth;
                    let tri = [
                        glam::Vec2::new(x0, -half),
                        glam::Vec2::new(x0 + tooth / 2.0, -half + OBJECT_UNIT / 4.0),
                        glam::Vec2::new(x0 + tooth, -half),
                    ];
                    ctx.fill_path(&tri, Fill::Solid(colors::SPIKE));
                    ctx.stroke_path(&tri, 1.5, colors::OUTLINE, false);
                }
                ctx.restore();
            }
            ObjectKind::Goal => {
                ctx.save();
                ctx.translate(self.x + half, self.y + half);
                let rect = ctx.round_rect_path(-half, -half, OBJECT_UNIT, OBJECT_UNIT, 6.0);
                ctx.fill_path(
                    &rect,
                    Fill::VerticalGradient {
                        from_y: half,
                        to_y: -OBJECT_UNIT,
                        from: colors::GOAL_TOP,
                        to: colors::GOAL_BOTTOM,
                    },
                );
                ctx.stroke_path(&rect, 2.0, colors::OUTLINE, true);
                ctx.restore();
            }
            ObjectKind::Particles(emitter) => {
                for p in &emitter.particles {
                    ctx.save();
                    ctx.translate(self.x + p.x, self.y + p.y);
                    ctx.scale(p.life / 15.0, p.life / 15.0);
                    ctx.rotate(p.angle);
                    ctx.fill_rect(-3.0, -3.0, 6.0, 6.0, emitter.color);
                    ctx.restore();
                }
            }
            ObjectKind::Player(player) => {
                let (sx, sy) = if reduced_motion {
                    (1.0, 1.0)
                } else {
                    player.squish_scale()
                };
                ctx.save();
                ctx.translate(self.x + half, self.y + half);
                ctx.scale(sx * player.win_scale, sy * player.win_scale);
                ctx.rotate(self.rotation);
                let fill = Fill::VerticalGradient {
                    from_y: half,
                    to_y: -OBJECT_UNIT,
                    from: colors::PLAYER_TOP,
                    to: colors::PLAYER_BOTTOM,
                };
                let outline = match player.icon.resolved() {
                    Icon::Ball => ctx.circle_path(0.0, 0.0, half, 20),
                    Icon::Gradient => {
                        ctx.round_rect_path(-half, -half, OBJECT_UNIT, OBJECT_UNIT, 3.0)
                    }
                };
                ctx.fill_path(&outline, fill);
                ctx.stroke_path(&outline, 2.0, colors::OUTLINE, true);
                ctx.restore();
            }
        }
    }
}

/// Dark-at-the-top shading shared by blocks and spikes
fn shade_gradient() -> Fill {
    Fill::VerticalGradient {
        from_y: OBJECT_UNIT / 2.0,
        to_y: -OBJECT_UNIT,
        from: [0.0, 0.0, 0.0, 0.0],
        to: [0.0, 0.0, 0.0, 0.8],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behavior_table() {
        assert_eq!(ObjectType::Block.behavior().collision, Collision::Solid);
        assert_eq!(ObjectType::Spike.behavior().collision, Collision::Deadly);
        assert_eq!(ObjectType::GroundSpike.behavior().collision, Collision::Deadly);
        assert_eq!(ObjectType::Goal.behavior().collision, Collision::Goal);
        assert!(ObjectType::Particles.behavior().hitbox.is_none());
        assert!(!ObjectType::Player.behavior().deletable);
        assert!(!ObjectType::Goal.behavior().persisted);
    }

    #[test]
    fn test_spike_hitbox_is_inset() {
        let obj = GameObject::new(ObjectId(1), ObjectKind::Spike, 64.0, 32.0);
        let b = obj.abs_hitbox().unwrap();
        assert_eq!(b.left(), 72.0);
        assert_eq!(b.right(), 88.0);
        assert_eq!(b.bottom(), 32.0);
        assert_eq!(b.top(), 48.0);
    }

    #[test]
    fn test_abs_hitbox_is_fresh() {
        let mut obj = GameObject::new(ObjectId(1), ObjectKind::Block, 0.0, 0.0);
        let first = obj.abs_hitbox().unwrap();
        obj.x = 32.0;
        let second = obj.abs_hitbox().unwrap();
        assert_eq!(first.x, 0.0);
        assert_eq!(second.x, 32.0);
        assert_eq!(obj.hitbox().unwrap().x, 0.0);
    }

    #[test]
    fn test_illegal_placeable_types() {
        assert!(ObjectKind::from_placeable(ObjectType::Block).is_ok());
        assert_eq!(
            ObjectKind::from_placeable(ObjectType::Player).unwrap_err(),
            ObjectError::IllegalType(ObjectType::Player)
        );
        assert!(ObjectKind::from_placeable(ObjectType::Goal).is_err());
        assert!(ObjectKind::from_placeable(ObjectType::Particles).is_err());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&ObjectType::GroundSpike).unwrap();
        assert_eq!(json, "\"ground-spike\"");
        let ty: ObjectType = serde_json::from_str("\"block\"").unwrap();
        assert_eq!(ty, ObjectType::Block);
    }
}
