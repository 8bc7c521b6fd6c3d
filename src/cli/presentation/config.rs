//! Effective configuration output.

use crate::cli::presentation::shared::to_json;
use crate::config::ConvergeConfig;
use crate::error::ApiError;

/// Render the merged configuration as TOML (default) or JSON
pub fn format_config(config: &ConvergeConfig, format: &str) -> Result<String, ApiError> {
    match format {
        "json" => to_json(config),
        _ => toml::to_string_pretty(config)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render TOML: {}", e))),
    }
}
