//! Reconciliation reports

use crate::error::{LedgerError, RemoteFailureKind};
use crate::reconcile::Unit;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    /// Remote state already matched
    Skipped,
    Applied {
        tx_hash: String,
    },
    Failed {
        kind: RemoteFailureKind,
        message: String,
    },
    /// Not attempted because an earlier unit it depends on failed
    Blocked {
        reason: String,
    },
}

impl UnitOutcome {
    pub fn failed(error: &LedgerError) -> Self {
        UnitOutcome::Failed {
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UnitOutcome::Failed { .. } | UnitOutcome::Blocked { .. })
    }

    fn severity(&self) -> u8 {
        match self {
            UnitOutcome::Skipped => 0,
            UnitOutcome::Applied { .. } => 1,
            UnitOutcome::Blocked { .. } => 2,
            UnitOutcome::Failed { .. } => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UnitOutcome::Skipped => "skipped",
            UnitOutcome::Applied { .. } => "applied",
            UnitOutcome::Failed { .. } => "failed",
            UnitOutcome::Blocked { .. } => "blocked",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            UnitOutcome::Skipped => "already converged".to_string(),
            UnitOutcome::Applied { tx_hash } => tx_hash.clone(),
            UnitOutcome::Failed { kind, message } => format!("{}: {}", kind, message),
            UnitOutcome::Blocked { reason } => reason.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    pub key: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
}

/// Overall result, derived from the worst unit outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Nothing needed changing
    AlreadyConverged,
    Converged,
    /// At least one unit failed or was blocked; rerun after fixing the cause
    Incomplete,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::AlreadyConverged => f.write_str("already converged"),
            RunStatus::Converged => f.write_str("converged"),
            RunStatus::Incomplete => f.write_str("incomplete"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub units: Vec<UnitReport>,
}

impl ReconciliationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, unit: &Unit, outcome: UnitOutcome) {
        self.units.push(UnitReport {
            key: unit.key(),
            description: unit.to_string(),
            outcome,
        });
    }

    pub fn status(&self) -> RunStatus {
        match self.units.iter().map(|u| u.outcome.severity()).max() {
            None | Some(0) => RunStatus::AlreadyConverged,
            Some(1) => RunStatus::Converged,
            Some(_) => RunStatus::Incomplete,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.status() != RunStatus::Incomplete
    }

    fn count(&self, label: &str) -> usize {
        self.units.iter().filter(|u| u.outcome.label() == label).count()
    }

    pub fn skipped(&self) -> usize {
        self.count("skipped")
    }

    /// Number of writes issued
    pub fn applied(&self) -> usize {
        self.count("applied")
    }

    pub fn failed(&self) -> usize {
        self.count("failed")
    }

    pub fn blocked(&self) -> usize {
        self.count("blocked")
    }

    pub fn outcome_of(&self, key: &str) -> Option<&UnitOutcome> {
        self.units.iter().find(|u| u.key == key).map(|u| &u.outcome)
    }
}
