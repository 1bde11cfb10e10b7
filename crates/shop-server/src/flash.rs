//! Flash Messages
//!
//! One-shot messages carried across a redirect in a cookie. The cookie
//! holds hex-encoded JSON, so its value never needs quoting.

use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "messages";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

impl FlashMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

/// `Set-Cookie` value storing `messages` for the next page
pub fn set_cookie(messages: &[FlashMessage]) -> String {
    let encoded = serde_json::to_vec(messages).map(hex::encode).unwrap_or_default();
    format!("{FLASH_COOKIE}={encoded}; Path=/; HttpOnly; SameSite=Lax; Max-Age=300")
}

/// `Set-Cookie` value deleting the flash cookie
pub fn clear_cookie() -> String {
    format!("{FLASH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Messages carried by the request's `Cookie` headers (malformed values are dropped)
pub fn from_headers(headers: &HeaderMap) -> Vec<FlashMessage> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == FLASH_COOKIE)
        .filter_map(|(_, value)| decode(value))
        .flatten()
        .collect()
}

/// Messages stored by a `Set-Cookie` value produced by [`set_cookie`]
pub fn from_set_cookie(value: &str) -> Vec<FlashMessage> {
    value
        .split(';')
        .next()
        .and_then(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == FLASH_COOKIE)
        .and_then(|(_, value)| decode(value))
        .unwrap_or_default()
}

fn decode(value: &str) -> Option<Vec<FlashMessage>> {
    let bytes = hex::decode(value.trim()).ok()?;
    serde_json::from_slice(&bytes).ok()
}
