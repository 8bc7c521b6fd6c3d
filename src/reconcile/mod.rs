//! State Reconciliation
//!
//! Converges remote contract state (role memberships, admin, balances) to a
//! declarative target. Planning and diffing are pure; the executor wraps
//! them with one read and at most one write per unit, so a run can be
//! repeated after any partial failure without duplicating effects.

pub mod diff;
pub mod executor;
pub mod report;

pub use diff::{diff, diff_unit, plan, validate_order};
pub use executor::{observe, Reconciler};
pub use report::{ReconciliationReport, RunStatus, UnitOutcome, UnitReport};

use crate::ledger::SignerSpec;
use crate::types::{serde_amount, Address, Amount, Hash};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;
use std::fmt;

/// Permission a principal can hold on a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Operator,
    Alerter,
    /// Principal may receive withdrawals of `token`
    WithdrawApproval { token: Address },
}

impl Role {
    /// View function reporting current membership
    ///
    /// List roles return every member; withdraw approval returns a flag for
    /// one `(token, principal)` pair.
    pub fn read_function(&self) -> &'static str {
        match self {
            Role::Operator => "getOperators",
            Role::Alerter => "getAlerters",
            Role::WithdrawApproval { .. } => "approvedWithdrawAddresses",
        }
    }

    pub fn grant_function(&self) -> &'static str {
        match self {
            Role::Operator => "addOperator",
            Role::Alerter => "addAlerter",
            Role::WithdrawApproval { .. } => "approveWithdrawAddress",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Operator => f.write_str("operator"),
            Role::Alerter => f.write_str("alerter"),
            Role::WithdrawApproval { token } => write!(f, "withdraw-approval[{}]", token),
        }
    }
}

/// Mapping key the reserve stores withdraw approvals under
///
/// Keccak-256 over the packed `token || principal` addresses.
pub fn withdraw_approval_key(token: &Address, principal: &Address) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(token.as_bytes());
    hasher.update(principal.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub contract: String,
    pub role: Role,
    pub principal: Address,
}

/// Hand contract administration to `new_admin`
///
/// Removes the reconciler's own authority, so it always runs after every
/// grant on the same contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminTransfer {
    pub contract: String,
    pub new_admin: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    Native,
    Token { contract: String },
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Token { contract } => f.write_str(contract),
        }
    }
}

/// Desired absolute balance of `holder`, topped up by `funder`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTarget {
    pub asset: Asset,
    pub holder: Address,
    #[serde(with = "serde_amount")]
    pub target_balance: Amount,
    pub funder: SignerSpec,
}

/// Declarative target for one reconciliation run; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredStateDescriptor {
    /// Signer for grants and admin transfers
    pub authority: SignerSpec,
    #[serde(default)]
    pub grants: Vec<RoleGrant>,
    #[serde(default)]
    pub admin_transfers: Vec<AdminTransfer>,
    #[serde(default)]
    pub funding: Vec<FundingTarget>,
}

impl DesiredStateDescriptor {
    pub fn new(authority: SignerSpec) -> Self {
        Self {
            authority,
            grants: Vec::new(),
            admin_transfers: Vec::new(),
            funding: Vec::new(),
        }
    }

    /// Add a grant unless an identical one is already present
    pub fn grant(&mut self, contract: &str, role: Role, principal: Address) -> &mut Self {
        let grant = RoleGrant {
            contract: contract.to_string(),
            role,
            principal,
        };
        if !self.grants.contains(&grant) {
            self.grants.push(grant);
        }
        self
    }

    pub fn transfer_admin(&mut self, contract: &str, new_admin: Address) -> &mut Self {
        self.admin_transfers.push(AdminTransfer {
            contract: contract.to_string(),
            new_admin,
        });
        self
    }

    pub fn fund(
        &mut self,
        asset: Asset,
        holder: Address,
        target_balance: Amount,
        funder: SignerSpec,
    ) -> &mut Self {
        self.funding.push(FundingTarget {
            asset,
            holder,
            target_balance,
            funder,
        });
        self
    }
}

/// One check-then-act step of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Unit {
    Grant(RoleGrant),
    TransferAdmin(AdminTransfer),
    Fund(FundingTarget),
}

/// Ordering class of a unit or operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Grant,
    TransferAdmin,
    Fund,
}

impl Unit {
    pub fn phase(&self) -> Phase {
        match self {
            Unit::Grant(_) => Phase::Grant,
            Unit::TransferAdmin(_) => Phase::TransferAdmin,
            Unit::Fund(_) => Phase::Fund,
        }
    }

    /// Contract whose authority the unit depends on
    pub fn contract(&self) -> Option<&str> {
        match self {
            Unit::Grant(g) => Some(&g.contract),
            Unit::TransferAdmin(t) => Some(&t.contract),
            Unit::Fund(_) => None,
        }
    }

    /// Stable key used for observations and reports
    pub fn key(&self) -> String {
        match self {
            Unit::Grant(g) => format!("grant:{}:{}:{}", g.contract, g.role, g.principal),
            Unit::TransferAdmin(t) => format!("admin:{}", t.contract),
            Unit::Fund(f) => format!("fund:{}:{}", f.asset, f.holder),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Grant(g) => write!(f, "{} {} on {}", g.role, g.principal, g.contract),
            Unit::TransferAdmin(t) => write!(f, "admin of {} -> {}", t.contract, t.new_admin),
            Unit::Fund(t) => write!(f, "fund {} with {} to {}", t.holder, t.asset, t.target_balance),
        }
    }
}

/// Remote value observed for one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Observation {
    Members(Vec<Address>),
    Flag(bool),
    Admin(Address),
    Balance(#[serde(with = "serde_amount")] Amount),
}

/// State-changing call the diff decided is needed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    GrantRole(RoleGrant),
    TransferAdmin(AdminTransfer),
    Fund {
        target: FundingTarget,
        #[serde(with = "serde_amount")]
        shortfall: Amount,
    },
}

impl Operation {
    pub fn phase(&self) -> Phase {
        match self {
            Operation::GrantRole(_) => Phase::Grant,
            Operation::TransferAdmin(_) => Phase::TransferAdmin,
            Operation::Fund { .. } => Phase::Fund,
        }
    }

    pub fn contract(&self) -> Option<&str> {
        match self {
            Operation::GrantRole(g) => Some(&g.contract),
            Operation::TransferAdmin(t) => Some(&t.contract),
            Operation::Fund { .. } => None,
        }
    }
}

/// Snapshot of observations keyed by unit key
///
/// Only used for dry-run planning; live runs observe each unit right
/// before deciding on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    observations: BTreeMap<String, Observation>,
}

impl ObservedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: &Unit, observation: Observation) {
        self.observations.insert(unit.key(), observation);
    }

    pub fn get(&self, unit: &Unit) -> Option<&Observation> {
        self.observations.get(&unit.key())
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}
