//! Level editor interaction
//!
//! The editor is a pure state machine: each tick the level hands it the
//! pointer cell, the object under the pointer and the button state, and gets
//! back at most one [`EditAction`] to apply to the arena. The ghost preview
//! is not an arena object, so it can never collide, be hovered or be saved.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::object::{ObjectId, ObjectType};
use crate::snap_to_grid;
use crate::consts::OBJECT_UNIT;

/// Active editor tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "tool", content = "type")]
pub enum Tool {
    /// Spawn objects of the given type
    Place(ObjectType),
    /// Drag existing objects (including the player start and the goal)
    Edit,
    /// Remove deletable objects
    Eraser,
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Place(ObjectType::Block)
    }
}

/// Pointer interaction state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    Hovering(ObjectId),
    Dragging(ObjectId),
    /// Button held with the place tool; one spawn per cell visited
    Placing { cell: Vec2 },
}

/// Non-colliding preview of the next placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ghost {
    pub ty: ObjectType,
    pub pos: Vec2,
}

/// Mutation requested by the editor for this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditAction {
    Spawn { ty: ObjectType, pos: Vec2 },
    Move { id: ObjectId, pos: Vec2 },
    Delete(ObjectId),
}

/// What the level knows about the pointer this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Placement position under the pointer
    pub cell: Vec2,
    pub down: bool,
    /// First object whose grid cell contains the pointer
    pub hovered: Option<ObjectId>,
    /// Whether the hovered object may be erased
    pub hovered_deletable: bool,
    /// Some object already sits exactly at `cell`
    pub cell_occupied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EditorState {
    pub tool: Tool,
    pub interaction: Interaction,
    pub ghost: Option<Ghost>,
    was_down: bool,
}

/// Placement position for a world-space pointer. Snapped to the lower-left
/// corner of the grid cell, or centred on the pointer when snapping is off.
pub fn pointer_cell(world: Vec2, snap: bool) -> Vec2 {
    if snap {
        Vec2::new(snap_to_grid(world.x), snap_to_grid(world.y))
    } else {
        world - Vec2::splat(OBJECT_UNIT / 2.0)
    }
}

impl EditorState {
    pub fn new(tool: Tool) -> Self {
        Self {
            tool,
            ..Default::default()
        }
    }

    /// Switch tools. Any drag or paint stroke in progress ends.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            log::info!("Editor tool -> {tool:?}");
        }
        self.tool = tool;
        self.interaction = Interaction::Idle;
        self.ghost = None;
    }

    /// Drop every object reference, e.g. after the arena was replaced
    pub fn reset(&mut self) {
        self.interaction = Interaction::Idle;
        self.ghost = None;
        self.was_down = false;
    }

    /// Object currently hovered or dragged
    pub fn focused(&self) -> Option<ObjectId> {
        match self.interaction {
            Interaction::Hovering(id) | Interaction::Dragging(id) => Some(id),
            _ => None,
        }
    }

    /// Advance one tick
    pub fn update(&mut self, sample: PointerSample) -> Option<EditAction> {
        let pressed = sample.down && !self.was_down;
        self.was_down = sample.down;

        let idle = match sample.hovered {
            Some(id) => Interaction::Hovering(id),
            None => Interaction::Idle,
        };

        match self.tool {
            Tool::Place(ty) => {
                self.ghost = Some(Ghost {
                    ty,
                    pos: sample.cell,
                });
                if !sample.down {
                    self.interaction = idle;
                    return None;
                }
                if matches!(self.interaction, Interaction::Placing { cell } if cell == sample.cell) {
                    return None;
                }
                self.interaction = Interaction::Placing { cell: sample.cell };
                if sample.cell_occupied {
                    return None;
                }
                Some(EditAction::Spawn {
                    ty,
                    pos: sample.cell,
                })
            }
            Tool::Edit => {
                self.ghost = None;
                if !sample.down {
                    self.interaction = idle;
                    return None;
                }
                match self.interaction {
                    Interaction::Dragging(id) => Some(EditAction::Move {
                        id,
                        pos: sample.cell,
                    }),
                    _ if pressed => {
                        let id = sample.hovered?;
                        self.interaction = Interaction::Dragging(id);
                        Some(EditAction::Move {
                            id,
                            pos: sample.cell,
                        })
                    }
                    _ => None,
                }
            }
            Tool::Eraser => {
                self.ghost = None;
                self.interaction = idle;
                match sample.hovered {
                    Some(id) if sample.down && sample.hovered_deletable => {
                        self.interaction = Interaction::Idle;
                        Some(EditAction::Delete(id))
                    }
                    _ => None,
                }
            }
        }
    }
}
