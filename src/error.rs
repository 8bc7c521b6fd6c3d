//! Error types for the converge ledger bootstrap system.

use crate::types::{NetworkId, ParseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deployment registry persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Deployment record not found: {name} on network {network}")]
    RecordNotFound { name: String, network: NetworkId },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Which side of a ledger round trip failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteFailureKind {
    RemoteReadFailure,
    RemoteWriteFailure,
}

impl std::fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteFailureKind::RemoteReadFailure => f.write_str("RemoteReadFailure"),
            RemoteFailureKind::RemoteWriteFailure => f.write_str("RemoteWriteFailure"),
        }
    }
}

/// Ledger client errors
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Read {contract}.{function} failed: {message}")]
    Read {
        contract: String,
        function: String,
        message: String,
    },

    #[error("Execute {contract}.{function} failed: {message}")]
    Write {
        contract: String,
        function: String,
        message: String,
    },

    #[error("Deploy {name} failed: {message}")]
    Deploy { name: String, message: String },

    #[error("Transfer to {to} failed: {message}")]
    Transfer { to: String, message: String },

    #[error("Unexpected value from {contract}.{function}: expected {expected}")]
    UnexpectedValue {
        contract: String,
        function: String,
        expected: &'static str,
    },
}

impl LedgerError {
    pub fn kind(&self) -> RemoteFailureKind {
        match self {
            LedgerError::Read { .. } | LedgerError::UnexpectedValue { .. } => {
                RemoteFailureKind::RemoteReadFailure
            }
            LedgerError::Write { .. } | LedgerError::Deploy { .. } | LedgerError::Transfer { .. } => {
                RemoteFailureKind::RemoteWriteFailure
            }
        }
    }
}

/// Allowlist entry validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowlistError {
    #[error("Entry {index}: missing price")]
    MissingPrice { index: usize },

    #[error("Entry {index}: size must be positive, got {size}")]
    NonPositiveSize { index: usize, size: i64 },

    #[error("Entry {index}: {source}")]
    InvalidField { index: usize, source: ParseError },

    #[error("Entry {index}: no beneficiary and no default beneficiary configured")]
    MissingBeneficiary { index: usize },

    #[error("Duplicate entry for beneficiary {beneficiary} at ({x},{y})")]
    DuplicateEntry { beneficiary: String, x: i64, y: i64 },

    #[error("Allowlist is empty")]
    Empty,
}

/// Top-level errors surfaced to pipelines and the CLI
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing dependency: {name} is not deployed on network {network}")]
    MissingDependency { name: String, network: NetworkId },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network {network} is protected; refusing to run {step} (pass --unblock to override)")]
    ProtectedNetwork { network: NetworkId, step: String },

    #[error("Fingerprint mismatch for {name} on network {network}: recorded {recorded}, computed {computed}")]
    FingerprintMismatch {
        name: String,
        network: NetworkId,
        recorded: String,
        computed: String,
    },

    #[error("Ordering violation: {0}")]
    OrderingViolation(String),

    /// Run finished with failed or blocked units; `report` is the rendered report
    #[error("Reconciliation {status}: rerun after fixing the failed units")]
    Incomplete { status: String, report: String },

    #[error("Allowlist error: {0}")]
    Allowlist(#[from] AllowlistError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
