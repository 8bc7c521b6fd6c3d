//! Pure planning and diffing
//!
//! Nothing here performs I/O. `plan` orders units, `diff_unit` decides
//! whether one unit needs a write, and `validate_order` rejects sequences
//! that would use authority after giving it away.

use crate::error::ApiError;
use crate::reconcile::{
    AdminTransfer, DesiredStateDescriptor, Observation, ObservedState, Operation, Phase, Role,
    RoleGrant, Unit,
};
use std::collections::BTreeSet;

/// Units in execution order: grants, then admin transfers, then funding
///
/// Order within each phase follows the descriptor.
pub fn plan(desired: &DesiredStateDescriptor) -> Vec<Unit> {
    let mut units: Vec<Unit> = desired.grants.iter().cloned().map(Unit::Grant).collect();
    units.extend(desired.admin_transfers.iter().cloned().map(Unit::TransferAdmin));
    units.extend(desired.funding.iter().cloned().map(Unit::Fund));
    units
}

/// Observation meaning "nothing there yet"
pub fn empty_observation(unit: &Unit) -> Observation {
    match unit {
        Unit::Grant(RoleGrant {
            role: Role::WithdrawApproval { .. },
            ..
        }) => Observation::Flag(false),
        Unit::Grant(_) => Observation::Members(Vec::new()),
        Unit::TransferAdmin(_) => Observation::Admin(crate::types::Address::ZERO),
        Unit::Fund(_) => Observation::Balance(0),
    }
}

/// Decide the write, if any, that brings one unit to its desired state
///
/// An observation of the wrong shape for the unit counts as "not
/// converged", so the write is issued rather than silently skipped.
pub fn diff_unit(unit: &Unit, observed: &Observation) -> Option<Operation> {
    match unit {
        Unit::Grant(grant) => {
            let present = match observed {
                Observation::Members(members) => members.contains(&grant.principal),
                Observation::Flag(flag) => *flag,
                _ => false,
            };
            (!present).then(|| Operation::GrantRole(grant.clone()))
        }
        Unit::TransferAdmin(transfer) => {
            let done = matches!(observed, Observation::Admin(admin) if *admin == transfer.new_admin);
            (!done).then(|| Operation::TransferAdmin(transfer.clone()))
        }
        Unit::Fund(target) => {
            let balance = match observed {
                Observation::Balance(balance) => *balance,
                _ => 0,
            };
            let shortfall = target.target_balance.saturating_sub(balance);
            (shortfall > 0).then(|| Operation::Fund {
                target: target.clone(),
                shortfall,
            })
        }
    }
}

/// Operations needed to take `observed` to `desired`, in execution order
///
/// Units with no recorded observation are diffed against an empty state.
pub fn diff(desired: &DesiredStateDescriptor, observed: &ObservedState) -> Vec<Operation> {
    plan(desired)
        .iter()
        .filter_map(|unit| {
            let empty = empty_observation(unit);
            diff_unit(unit, observed.get(unit).unwrap_or(&empty))
        })
        .collect()
}

/// Anything with an ordering phase and an optional owning contract
pub trait Sequenced {
    fn phase(&self) -> Phase;
    fn contract(&self) -> Option<&str>;
}

impl Sequenced for Unit {
    fn phase(&self) -> Phase {
        Unit::phase(self)
    }

    fn contract(&self) -> Option<&str> {
        Unit::contract(self)
    }
}

impl Sequenced for Operation {
    fn phase(&self) -> Phase {
        Operation::phase(self)
    }

    fn contract(&self) -> Option<&str> {
        Operation::contract(self)
    }
}

/// Reject any grant on a contract whose admin was already transferred
pub fn validate_order<T: Sequenced>(steps: &[T]) -> Result<(), ApiError> {
    let mut transferred: BTreeSet<&str> = BTreeSet::new();
    for step in steps {
        match (step.phase(), step.contract()) {
            (Phase::TransferAdmin, Some(contract)) => {
                transferred.insert(contract);
            }
            (Phase::Grant, Some(contract)) if transferred.contains(contract) => {
                return Err(ApiError::OrderingViolation(format!(
                    "grant on {} scheduled after its admin transfer",
                    contract
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Admin transfers that must wait because a grant on the same contract failed
pub(crate) fn is_blocked(transfer: &AdminTransfer, failed_contracts: &BTreeSet<String>) -> bool {
    failed_contracts.contains(&transfer.contract)
}
