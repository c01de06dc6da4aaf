//! Listing and review payloads returned by the level server

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::{ApiError, decode};

/// A published level in a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub name: String,
    pub publisher: String,
    pub plays: u32,
    #[serde(default)]
    pub clears: u32,
    #[serde(default)]
    pub reviews: u32,
    pub play_url: String,
    /// Only present for the caller's own levels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
    pub published_at: String,
}

impl LevelSummary {
    /// Fraction of plays that ended in a clear
    pub fn clear_rate(&self) -> Option<f32> {
        (self.plays > 0).then(|| self.clears as f32 / self.plays as f32)
    }
}

/// An unpublished draft owned by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WipLevel {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: u32,
    pub username: String,
    pub rating: u8,
    pub body: String,
    pub posted_at: String,
}

/// Reply to draft creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedWip {
    pub url: String,
}

pub fn decode_levels(value: Value) -> Result<Vec<LevelSummary>, ApiError> {
    decode(value)
}

pub fn decode_wip(value: Value) -> Result<Vec<WipLevel>, ApiError> {
    decode(value)
}

pub fn decode_reviews(value: Value) -> Result<Vec<Review>, ApiError> {
    decode(value)
}

pub fn decode_created_wip(value: Value) -> Result<CreatedWip, ApiError> {
    decode(value)
}

/// Mean star rating, `None` without reviews
pub fn average_rating(reviews: &[Review]) -> Option<f32> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| r.rating as u32).sum();
    Some(total as f32 / reviews.len() as f32)
}
