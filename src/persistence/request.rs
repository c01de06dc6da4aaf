//! Requests to the level server
//!
//! The engine never performs I/O itself. It builds [`ApiRequest`] values,
//! the host sends them and feeds the decoded outcome back. Everything here is
//! plain data so it can be tested without a browser.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::sim::level_data::LevelData;
use crate::sim::player::Icon;

/// Name of the CSRF parameter and of the page meta tag holding it
pub const CSRF_FIELD: &str = "csrf_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// State transitions on a stored draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipAction {
    Publish,
    Unpublish,
    /// Republish over the existing published level
    Update,
    Delete,
}

impl WipAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WipAction::Publish => "publish",
            WipAction::Unpublish => "unpublish",
            WipAction::Update => "update",
            WipAction::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    CreateAccount,
    Login,
    Logout,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::CreateAccount => "create-account",
            AuthAction::Login => "login",
            AuthAction::Logout => "logout",
        }
    }
}

/// A failed request. Every variant ends up in front of the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a response
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response; `reason` comes from the server's `{reason}` body
    #[error("{reason} (HTTP {status})")]
    Rejected { status: u16, reason: String },
    /// 2xx response that did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 404, .. })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// One request, before the CSRF token is attached
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Query string for GET, JSON body otherwise
    pub params: Map<String, Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Map::new(),
        }
    }

    fn with_params(mut self, params: Value) -> Self {
        match params {
            Value::Object(map) => self.params.extend(map),
            Value::Null => {}
            other => log::error!("Request params must be an object, got {other}"),
        }
        self
    }

    /// Published levels, or only the caller's own
    pub fn list_levels(mine: bool) -> Self {
        let path = if mine { "/api/levels/my" } else { "/api/levels" };
        Self::new(Method::Get, path)
    }

    /// The caller's unpublished drafts
    pub fn list_wip() -> Self {
        Self::new(Method::Get, "/api/levels/wip")
    }

    /// Create an empty draft. The response carries the editor URL.
    pub fn create_wip() -> Self {
        Self::new(Method::Post, "/api/levels/wip")
    }

    pub fn level_data(id: u32) -> Self {
        Self::new(Method::Get, format!("/api/levels/{id}/data"))
    }

    pub fn wip_level_data(id: u32) -> Self {
        Self::new(Method::Get, format!("/api/levels/wip/{id}/data"))
    }

    /// Overwrite a draft's level definition
    pub fn update_level_data(id: u32, data: &LevelData) -> Result<Self, ApiError> {
        let body = serde_json::to_value(data)?;
        Ok(Self::new(Method::Post, format!("/api/levels/wip/{id}/update-data")).with_params(body))
    }

    pub fn rename_wip(id: u32, name: &str) -> Self {
        Self::new(Method::Post, format!("/api/levels/wip/{id}/update-metadata"))
            .with_params(serde_json::json!({ "name": name }))
    }

    pub fn wip_action(id: u32, action: WipAction) -> Self {
        Self::new(
            Method::Post,
            format!("/api/levels/wip/{id}/{}", action.as_str()),
        )
    }

    pub fn mark_played(id: u32) -> Self {
        Self::new(Method::Post, format!("/api/levels/{id}/mark-as-played"))
    }

    pub fn mark_cleared(id: u32) -> Self {
        Self::new(Method::Post, format!("/api/levels/{id}/mark-as-cleared"))
    }

    pub fn reviews(id: u32) -> Self {
        Self::new(Method::Get, format!("/api/levels/{id}/reviews"))
    }

    pub fn post_review(id: u32, rating: u8, body: &str) -> Self {
        Self::new(Method::Post, format!("/api/levels/{id}/reviews"))
            .with_params(serde_json::json!({ "rating": rating, "body": body }))
    }

    /// Remove the caller's reviews of a level
    pub fn delete_reviews(id: u32) -> Self {
        Self::new(Method::Delete, format!("/api/levels/{id}/reviews"))
    }

    pub fn user_icon() -> Self {
        Self::new(Method::Get, "/api/user/icon")
    }

    pub fn set_user_icon(icon: Icon) -> Self {
        Self::new(Method::Post, "/api/user/icon")
            .with_params(serde_json::json!({ "icon": icon.as_str() }))
    }

    /// Credentials are ignored for logout
    pub fn auth(action: AuthAction, username: &str, password: &str) -> Self {
        let req = Self::new(Method::Post, format!("/api/auth/{}", action.as_str()));
        match action {
            AuthAction::Logout => req,
            _ => req.with_params(serde_json::json!({
                "username": username,
                "password": password,
            })),
        }
    }

    /// Full URL path. GET parameters and the CSRF token go in the query
    /// string; other methods carry them in the body.
    pub fn url(&self, csrf: Option<&str>) -> String {
        if self.method != Method::Get {
            return self.path.clone();
        }
        let mut pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(&query_value(v))))
            .collect();
        if let Some(token) = csrf {
            pairs.push(format!("{CSRF_FIELD}={}", encode_component(token)));
        }
        if pairs.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, pairs.join("&"))
        }
    }

    /// JSON body, `None` for GET
    pub fn body(&self, csrf: Option<&str>) -> Option<String> {
        if self.method == Method::Get {
            return None;
        }
        let mut params = self.params.clone();
        if let Some(token) = csrf {
            params.insert(CSRF_FIELD.to_string(), Value::String(token.to_string()));
        }
        Some(Value::Object(params).to_string())
    }
}

fn query_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Percent-encode everything outside the unreserved set
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Turn a raw HTTP response into a JSON value or an [`ApiError`]
pub fn parse_response(status: u16, body: &str) -> Result<Value, ApiError> {
    let json = if body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(body)
    };

    if (200..300).contains(&status) {
        return Ok(json?);
    }

    let reason = json
        .ok()
        .and_then(|v| v.get("reason").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("request failed with status {status}"));
    Err(ApiError::Rejected { status, reason })
}

/// Decode a successful response payload
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}
