//! Allowlist presentation: build summary and bundle verification.

use crate::allowlist::{Allowlist, ProofBundle};
use crate::cli::presentation::shared::{abbreviate, heading, to_json};
use crate::error::ApiError;
use crate::types::hash_hex;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Outcome of checking every proof in a bundle
#[derive(Debug, Clone, Serialize)]
pub struct BundleVerification {
    pub root: String,
    pub total: usize,
    /// Keys of entries whose proof does not verify
    pub invalid: Vec<String>,
}

pub fn format_allowlist_build(allowlist: &Allowlist, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&ProofBundle::from_allowlist(allowlist));
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n\n", heading("Allowlist")));
    out.push_str(&format!("  Root: {}\n", hash_hex(&allowlist.root)));
    out.push_str(&format!("  Entries: {}\n", allowlist.len()));
    out.push_str(&format!("  Leaves (padded): {}\n\n", allowlist.padded_leaves));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Beneficiary", "Parcel", "Size", "Price", "Reserved", "Proof"]);
    for entry in &allowlist.entries {
        let proof_len = allowlist.proof(&entry.key()).map(|p| p.len()).unwrap_or(0);
        table.add_row(vec![
            abbreviate(&entry.beneficiary.to_string()),
            format!("({}, {})", entry.x, entry.y),
            entry.size.to_string(),
            entry.price.to_string(),
            entry
                .reserved
                .map(|a| abbreviate(&a.to_string()))
                .unwrap_or_else(|| "-".to_string()),
            format!("{} hashes", proof_len),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    Ok(out)
}

pub fn format_bundle_verification(result: &BundleVerification) -> String {
    if result.invalid.is_empty() {
        format!(
            "{} all {} proofs verify against {}",
            "ok:".green().bold(),
            result.total,
            result.root
        )
    } else {
        let mut out = format!(
            "{} {} of {} proofs do not verify against {}",
            "failed:".red().bold(),
            result.invalid.len(),
            result.total,
            result.root
        );
        for key in &result.invalid {
            out.push_str(&format!("\n  - {}", key));
        }
        out
    }
}
