//! Shared presentation helpers.

use crate::error::ApiError;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Pretty JSON for any serializable result
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)))
}

pub fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// First and last characters of a long hex string
pub fn abbreviate(hex: &str) -> String {
    if hex.len() <= 18 {
        hex.to_string()
    } else {
        format!("{}..{}", &hex[..10], &hex[hex.len() - 6..])
    }
}
