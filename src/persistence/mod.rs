//! Request/response boundary to the level server
//!
//! Features:
//! - Route builders for levels, drafts, reviews, icons and auth
//! - CSRF token placement (query for GET, JSON body otherwise)
//! - `{reason}` error bodies mapped to [`ApiError`]
//! - Listing and review payload types

pub mod listing;
pub mod request;

pub use listing::{LevelSummary, Review, WipLevel};
pub use request::{ApiError, ApiRequest, AuthAction, Method, WipAction, parse_response};
