//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Stable category for an error, shown as `error[category]`
pub fn error_category(e: &ApiError) -> &'static str {
    match e {
        ApiError::MissingDependency { .. } => "missing-dependency",
        ApiError::ConfigError(_) => "config",
        ApiError::ProtectedNetwork { .. } => "protected-network",
        ApiError::FingerprintMismatch { .. } => "fingerprint-mismatch",
        ApiError::OrderingViolation(_) => "ordering",
        ApiError::Incomplete { .. } => "incomplete",
        ApiError::Allowlist(_) => "allowlist",
        ApiError::Ledger(_) => "ledger",
        ApiError::StorageError(_) => "storage",
    }
}

/// Output a failed command still has to show on stdout
pub fn partial_output(e: &ApiError) -> Option<&str> {
    match e {
        ApiError::Incomplete { report, .. } => Some(report.as_str()),
        _ => None,
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    format!("error[{}]: {}", error_category(e), e)
}
