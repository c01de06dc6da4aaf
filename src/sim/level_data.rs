//! Serializable level definition
//!
//! This is the JSON blob the server stores per level. Positions are world
//! units; editor placements are always grid aligned.

use serde::{Deserialize, Serialize};

use super::object::ObjectType;
use crate::consts::OBJECT_UNIT;

/// One placed object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub ty: ObjectType,
}

/// A complete level definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelData {
    #[serde(default = "default_player_x")]
    pub player_x: f32,
    #[serde(default = "default_player_y")]
    pub player_y: f32,
    /// Goal position; absent in levels saved before goals existed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_y: Option<f32>,
    #[serde(default)]
    pub objects: Vec<LevelObject>,
}

fn default_player_x() -> f32 {
    3.0 * OBJECT_UNIT
}

fn default_player_y() -> f32 {
    2.0 * OBJECT_UNIT
}

impl Default for LevelData {
    /// What a freshly created draft (`{}` on the server) loads as
    fn default() -> Self {
        Self {
            player_x: default_player_x(),
            player_y: default_player_y(),
            end_x: None,
            end_y: None,
            objects: Vec::new(),
        }
    }
}

impl LevelData {
    /// Parse a level blob from the server
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Goal position if the level has one
    pub fn goal(&self) -> Option<(f32, f32)> {
        match (self.end_x, self.end_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    pub fn set_goal(&mut self, x: f32, y: f32) {
        self.end_x = Some(x);
        self.end_y = Some(y);
    }

    /// Built-in demo level
    pub fn test_level() -> Self {
        let cell = |x: f32, y: f32, ty| LevelObject {
            x: x * OBJECT_UNIT,
            y: y * OBJECT_UNIT,
            ty,
        };
        Self {
            player_x: 3.0 * OBJECT_UNIT,
            player_y: 10.0 * OBJECT_UNIT,
            end_x: Some(22.0 * OBJECT_UNIT),
            end_y: Some(OBJECT_UNIT),
            objects: vec![
                cell(6.0, 2.0, ObjectType::Block),
                cell(10.0, 3.0, ObjectType::Block),
                cell(14.0, 4.0, ObjectType::Block),
                cell(15.0, 4.0, ObjectType::Block),
                cell(16.0, 4.0, ObjectType::Block),
                cell(16.0, 5.0, ObjectType::Spike),
                cell(17.0, 4.0, ObjectType::Block),
                cell(18.0, 4.0, ObjectType::Block),
                cell(20.0, 3.0, ObjectType::Block),
                cell(20.0, 2.0, ObjectType::Block),
                cell(20.0, 1.0, ObjectType::Block),
                cell(12.0, 1.0, ObjectType::GroundSpike),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let json = r#"{"playerX":32,"playerY":64,"endX":320,"endY":32,
            "objects":[{"x":96,"y":64,"type":"block"},{"x":0,"y":0,"type":"ground-spike"}]}"#;
        let data = LevelData::from_json(json).unwrap();
        assert_eq!(data.player_x, 32.0);
        assert_eq!(data.goal(), Some((320.0, 32.0)));
        assert_eq!(data.objects.len(), 2);
        assert_eq!(data.objects[1].ty, ObjectType::GroundSpike);

        let out: serde_json::Value = serde_json::from_str(&data.to_json().unwrap()).unwrap();
        assert_eq!(out["objects"][0]["type"], "block");
        assert_eq!(out["objects"][0]["x"], 96.0);
        assert_eq!(out["playerY"], 64.0);
    }

    #[test]
    fn test_empty_draft_loads_as_default() {
        let data = LevelData::from_json("{}").unwrap();
        assert_eq!(data, LevelData::default());
        assert!(data.goal().is_none());
        let json = data.to_json().unwrap();
        assert!(!json.contains("endX"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"objects":[{"x":0,"y":0,"type":"lava"}]}"#;
        assert!(LevelData::from_json(json).is_err());
    }
}
