//! Registry presentation: record tables.

use crate::cli::presentation::shared::{abbreviate, to_json};
use crate::error::ApiError;
use crate::store::DeploymentRecord;
use crate::types::hash_hex;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_records(records: &[DeploymentRecord], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(records);
    }
    if records.is_empty() {
        return Ok("No deployments recorded.".to_string());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Artifact", "Address", "Fingerprint", "Deployed at"]);
    for record in records {
        table.add_row(vec![
            record.name.clone(),
            record.artifact.clone(),
            record.address.to_string(),
            abbreviate(&hash_hex(&record.fingerprint)),
            record.deployed_at.to_rfc3339(),
        ]);
    }
    Ok(table.to_string())
}

pub fn format_record(record: &DeploymentRecord, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(record);
    }
    Ok(format!(
        "{} on network {}\n  Artifact: {}\n  Address: {}\n  Fingerprint: {}\n  Deployed at: {}\n  Tx: {} (block {}, gas {})",
        record.name,
        record.network,
        record.artifact,
        record.address,
        hash_hex(&record.fingerprint),
        record.deployed_at.to_rfc3339(),
        record.receipt.tx_hash,
        record.receipt.block_number,
        record.receipt.gas_used
    ))
}
