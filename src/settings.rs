//! Engine settings and preferences
//!
//! Persisted separately from level data in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::renderer::vertex::parse_hex;

/// How wide the collision bands around a surface are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ToleranceMode {
    /// Band grows with the player's speed along the axis (never below 4)
    #[default]
    VelocityScaled,
    /// Constant band of 8 units. Fast falls can tunnel through thin objects.
    Fixed,
}

/// Engine settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    /// Collision band width
    pub tolerance: ToleranceMode,

    // === Editor ===
    /// Snap placements and drags to the grid
    pub snap_to_grid: bool,

    // === Visual Effects ===
    /// Death and victory particle bursts
    pub particles: bool,
    /// Death burst colour (CSS hex)
    pub death_color: String,
    /// Victory burst colour (CSS hex)
    pub win_color: String,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (no squash and stretch)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tolerance: ToleranceMode::VelocityScaled,

            snap_to_grid: true,

            particles: true,
            death_color: "#f07".to_string(),
            win_color: "#ffd700".to_string(),

            show_fps: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse settings JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Effective squash and stretch (respects reduced_motion)
    pub fn effective_squish(&self) -> bool {
        !self.reduced_motion
    }

    /// Death burst colour as linear RGBA. Falls back to the default on a bad
    /// hex string.
    pub fn death_rgba(&self) -> [f32; 4] {
        parse_hex(&self.death_color).unwrap_or_else(|| {
            log::warn!("Bad death colour {:?}", self.death_color);
            [1.0, 0.0, 0.467, 1.0]
        })
    }

    pub fn win_rgba(&self) -> [f32; 4] {
        parse_hex(&self.win_color).unwrap_or_else(|| {
            log::warn!("Bad win colour {:?}", self.win_color);
            [1.0, 0.843, 0.0, 1.0]
        })
    }

    /// Key under which the JSON blob is kept in LocalStorage
    pub const STORAGE_KEY: &'static str = "blockhop_settings";

    /// Stored settings, or defaults when nothing usable is stored
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = local_storage().and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten());
        let Some(json) = stored else {
            log::info!("No stored settings, using defaults");
            return Self::default();
        };
        Self::from_json(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring stored settings: {e}");
            Self::default()
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = local_storage() else {
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Could not store settings");
                }
            }
            Err(e) => log::warn!("Could not encode settings: {e}"),
        }
    }

    /// Nothing is persisted natively
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"tolerance":"Fixed","show_fps":true}"#).unwrap();
        assert_eq!(settings.tolerance, ToleranceMode::Fixed);
        assert!(settings.show_fps);
        assert!(settings.snap_to_grid);
        assert_eq!(settings.death_color, "#f07");
    }

    #[test]
    fn test_colours() {
        let settings = Settings::default();
        let death = settings.death_rgba();
        assert_eq!(death[0], 1.0);
        assert_eq!(death[1], 0.0);

        let bad = Settings {
            win_color: "gold".to_string(),
            ..Default::default()
        };
        assert_eq!(bad.win_rgba(), [1.0, 0.843, 0.0, 1.0]);
    }

    #[test]
    fn test_reduced_motion_disables_squish() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!settings.effective_squish());
    }
}
