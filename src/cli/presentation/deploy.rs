//! Deployment presentation: fingerprint preview and sale deployment result.

use crate::cli::presentation::shared::{heading, to_json};
use crate::error::ApiError;
use crate::pipeline::SaleDeployment;
use crate::types::hash_hex;
use owo_colors::OwoColorize;
use serde::Serialize;

/// What a deploy would do with the current inputs
#[derive(Debug, Clone, Serialize)]
pub struct FingerprintStatus {
    pub name: String,
    pub network: String,
    pub computed: String,
    pub recorded: Option<String>,
    pub address: Option<String>,
}

impl FingerprintStatus {
    pub fn would_reuse(&self) -> bool {
        self.recorded.as_deref() == Some(self.computed.as_str())
    }
}

pub fn format_fingerprint(status: &FingerprintStatus, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        let mut value = serde_json::to_value(status)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)))?;
        value["would_reuse"] = serde_json::Value::Bool(status.would_reuse());
        return to_json(&value);
    }

    let mut out = format!("{}\n\n", heading(&format!("{} on {}", status.name, status.network)));
    out.push_str(&format!("  Computed: {}\n", status.computed));
    match (&status.recorded, &status.address) {
        (Some(recorded), Some(address)) => {
            out.push_str(&format!("  Recorded: {} at {}\n", recorded, address));
        }
        _ => out.push_str("  Recorded: none\n"),
    }
    let verdict = if status.would_reuse() {
        format!("{}", "reuse".green())
    } else {
        format!("{}", "deploy".yellow())
    };
    out.push_str(&format!("  Next deploy: {}\n", verdict));
    Ok(out)
}

pub fn format_sale_deployment(
    name: &str,
    deployment: &SaleDeployment,
    format: &str,
) -> Result<String, ApiError> {
    let resolution = &deployment.resolution;
    if format == "json" {
        return to_json(&serde_json::json!({
            "name": name,
            "address": resolution.address,
            "newly_deployed": resolution.newly_deployed,
            "fingerprint": hash_hex(&resolution.fingerprint),
            "merkle_root": hash_hex(&deployment.allowlist.root),
            "entries": deployment.allowlist.len(),
            "receipt": resolution.receipt,
        }));
    }

    if let (true, Some(receipt)) = (resolution.newly_deployed, &resolution.receipt) {
        Ok(format!(
            "{} {} deployed at {} for gas {} (tx {})",
            "deployed:".green().bold(),
            name,
            resolution.address,
            receipt.gas_used,
            receipt.tx_hash
        ))
    } else {
        Ok(format!(
            "{} reusing {} at {}",
            "unchanged:".dimmed(),
            name,
            resolution.address
        ))
    }
}
