//! Reconciliation presentation: dry-run plan and run report.

use crate::cli::presentation::shared::{heading, to_json};
use crate::error::ApiError;
use crate::reconcile::{Operation, ReconciliationReport, RunStatus, UnitOutcome};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn describe(operation: &Operation) -> String {
    match operation {
        Operation::GrantRole(grant) => format!(
            "{}.{}({})",
            grant.contract,
            grant.role.grant_function(),
            grant.principal
        ),
        Operation::TransferAdmin(transfer) => format!(
            "{}.transferAdminQuickly({})",
            transfer.contract, transfer.new_admin
        ),
        Operation::Fund { target, shortfall } => format!(
            "send {} {} to {} as {}",
            shortfall, target.asset, target.holder, target.funder.from
        ),
    }
}

pub fn format_plan(operations: &[Operation], format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(operations);
    }
    if operations.is_empty() {
        return Ok(format!("{} nothing to do", "converged:".green().bold()));
    }
    let mut out = format!("{}\n\n", heading(&format!("{} pending writes", operations.len())));
    for (i, op) in operations.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, describe(op)));
    }
    Ok(out)
}

pub fn format_report(report: &ReconciliationReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&serde_json::json!({
            "status": report.status(),
            "applied": report.applied(),
            "skipped": report.skipped(),
            "failed": report.failed(),
            "blocked": report.blocked(),
            "units": report.units,
        }));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Unit", "Outcome", "Detail"]);
    for unit in &report.units {
        let label = match unit.outcome {
            UnitOutcome::Skipped => format!("{}", unit.outcome.label().dimmed()),
            UnitOutcome::Applied { .. } => format!("{}", unit.outcome.label().green()),
            UnitOutcome::Blocked { .. } => format!("{}", unit.outcome.label().yellow()),
            UnitOutcome::Failed { .. } => format!("{}", unit.outcome.label().red()),
        };
        table.add_row(vec![unit.description.clone(), label, unit.outcome.detail()]);
    }

    let status = match report.status() {
        RunStatus::Incomplete => format!("{}", report.status().to_string().red().bold()),
        other => format!("{}", other.to_string().green().bold()),
    };
    Ok(format!(
        "{}\n\nStatus: {} ({} applied, {} skipped, {} failed, {} blocked)",
        table,
        status,
        report.applied(),
        report.skipped(),
        report.failed(),
        report.blocked()
    ))
}
