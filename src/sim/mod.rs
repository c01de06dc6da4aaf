//! Simulation core
//!
//! All gameplay logic lives here:
//! - Variable timestep in 60ths of a second, driven by the frame clock
//! - Seeded RNG only (particle bursts)
//! - Stable iteration order (arena insertion order)
//! - No platform dependencies; rendering only through `DrawContext`

pub mod collision;
pub mod editor;
pub mod geometry;
pub mod input;
pub mod level;
pub mod level_data;
pub mod object;
pub mod particles;
pub mod player;

pub use collision::{Collider, ContactReport, Contacts, resolve_contacts};
pub use editor::{EditorState, Interaction, Tool};
pub use geometry::Hitbox;
pub use input::InputState;
pub use level::{Level, LevelEvent, LevelMode, LevelSource, PendingRequest, RequestKind};
pub use level_data::{LevelData, LevelObject};
pub use object::{Collision, GameObject, ObjectError, ObjectId, ObjectKind, ObjectType};
pub use particles::ParticleEmitter;
pub use player::{Cosmetic, Icon, Player};
